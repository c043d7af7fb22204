//! RiskDesk service library: directory, resolver, reconciler and desk.

pub mod clipboard;
pub mod config;
pub mod desk;
pub mod directory;
pub mod reconciler;
pub mod resolver;
pub mod store;

pub use config::Config;
pub use desk::{Preview, TicketDesk};
pub use directory::{DirectoryRefresh, DirectorySource, DutyDirectory};
pub use reconciler::{Applied, Promotion, TicketReconciler};
pub use resolver::{DutyResolver, Resolution};
pub use store::{ChangeEvent, ChangeOp, MemoryTicketStore, TicketStore};
