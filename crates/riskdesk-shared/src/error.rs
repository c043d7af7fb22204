//! Error types for the desk.
//!
//! Lookup and render paths never fail; only catalog construction and the
//! write path to the ticket store return errors.

use crate::fields::FieldId;
use crate::ticket::{PersistedId, TicketId};
use crate::validator::ValidationIssue;
use thiserror::Error;

/// Descriptor shape errors, raised when a catalog is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Provider descriptor has an empty name")]
    EmptyName,

    #[error("Provider {0} is described twice")]
    DuplicateProvider(String),

    #[error("Provider {provider}: field {field} is named by more than one requirement")]
    RepeatedField { provider: String, field: FieldId },

    #[error("Provider {provider}: {field} is required but has no options")]
    MissingOptions { provider: String, field: FieldId },

    #[error("Provider {provider}: script reads {field} which no requirement covers")]
    UncoveredScriptInput { provider: String, field: FieldId },

    #[error("Provider {0} is manual-only but lists required fields")]
    ManualWithRequirements(String),

    #[error("Provider {0}: manual flag and script template disagree")]
    ScriptMismatch(String),
}

/// Failures reported by the ticket store collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store rejected the write: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Ticket {0} not found in store")]
    NotFound(PersistedId),
}

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("{0}")]
    AccessViolation(String),

    #[error("Ticket is incomplete: {}", join_issues(.0))]
    ValidationIncomplete(Vec<ValidationIssue>),

    #[error("Write failed and was rolled back: {0}")]
    Persistence(#[from] StoreError),

    #[error("Ticket {0} not found")]
    NotFound(TicketId),

    #[error("Ticket {0} is still being saved")]
    WritePending(TicketId),

    #[error("Ticket {0} is already completed")]
    AlreadyCompleted(TicketId),

    #[error("Abnormal completion needs an abnormal type")]
    MissingAbnormalType,

    #[error("Provider catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DeskError {
    pub fn code(&self) -> i32 {
        match self {
            DeskError::AccessViolation(_) => -33001,
            DeskError::ValidationIncomplete(_) => -33002,
            DeskError::Persistence(_) => -33003,
            DeskError::NotFound(_) => -33004,
            DeskError::WritePending(_) => -33005,
            DeskError::AlreadyCompleted(_) => -33006,
            DeskError::MissingAbnormalType => -33007,
            DeskError::Catalog(_) => -33008,
        }
    }

    /// Only persistence failures need corrective action (retry the write)
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeskError::Persistence(_))
    }
}
