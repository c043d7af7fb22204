//! Shared types and rules for the RiskDesk components.
//!
//! Everything here is pure: duty and field types, the provider rule set,
//! the ticket validator, script rendering and the ticket model.

pub mod completion;
pub mod duty;
pub mod error;
pub mod fields;
pub mod helpers;
pub mod providers;
pub mod scripts;
pub mod ticket;
pub mod validator;

pub use duty::{access_error, DirectoryEntry, DutyId};
pub use error::{CatalogError, DeskError, StoreError};
pub use fields::{FieldId, TicketFields};
pub use providers::{ProviderCatalog, ProviderDescriptor, Requirement};
pub use scripts::{is_placeholder, ScriptTemplate};
pub use ticket::{
    Completion, LocalId, NaturalKey, PersistedId, Ticket, TicketForm, TicketId, TicketPatch,
    TicketStatus,
};
pub use validator::{ValidationIssue, Verdict};

/// Merchant owning member ids without a merchant suffix
pub const HOUSE_MERCHANT: &str = "QQ288";

/// Work name used when the agent's email is unknown
pub const DEFAULT_ACTOR_NAME: &str = "RiskOps";
