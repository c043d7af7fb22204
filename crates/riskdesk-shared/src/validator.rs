//! Ticket validator: gates the submit action.
//!
//! Pure function of a descriptor, the form values and the resolver's
//! access verdict. Rules, in order:
//! 1. manual-only providers are never submittable
//! 2. member id present and no access error
//! 3. every plain required field present
//! 4. every either-or group has its anchor and at least one alternative

use crate::fields::{FieldId, TicketFields};
use crate::providers::{ProviderDescriptor, Requirement};
use serde::{Deserialize, Serialize};

/// Why a ticket is not ready, surfaced per field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    /// Provider has no electronic submission path
    ManualOnly,
    /// Resolver reported the merchant belongs to another duty
    AccessDenied,
    Missing(FieldId),
    /// Neither alternative of an either-or group is filled
    MissingOneOf(FieldId, FieldId),
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManualOnly => write!(f, "provider is checked manually"),
            Self::AccessDenied => write!(f, "merchant belongs to another duty"),
            Self::Missing(field) => write!(f, "{} is required", field),
            Self::MissingOneOf(a, b) => write!(f, "{} or {} is required", a, b),
        }
    }
}

/// Validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub issues: Vec<ValidationIssue>,
}

impl Verdict {
    /// Ready to submit
    pub fn is_ready(&self) -> bool {
        self.issues.is_empty()
    }

    /// Fields that need attention, for per-field highlighting
    pub fn flagged_fields(&self) -> Vec<FieldId> {
        let mut out = Vec::new();
        for issue in &self.issues {
            match issue {
                ValidationIssue::Missing(f) => out.push(*f),
                ValidationIssue::MissingOneOf(a, b) => {
                    out.push(*a);
                    out.push(*b);
                }
                ValidationIssue::AccessDenied => out.push(FieldId::MemberId),
                ValidationIssue::ManualOnly => {}
            }
        }
        out.dedup();
        out
    }

    fn push(&mut self, issue: ValidationIssue) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }
}

/// Evaluate `descriptor` against the form values
pub fn validate(
    descriptor: &ProviderDescriptor,
    fields: &TicketFields,
    has_access_error: bool,
) -> Verdict {
    let mut verdict = Verdict::default();

    if descriptor.manual_only {
        verdict.push(ValidationIssue::ManualOnly);
        return verdict;
    }

    if !fields.is_present(FieldId::MemberId) {
        verdict.push(ValidationIssue::Missing(FieldId::MemberId));
    }
    if has_access_error {
        verdict.push(ValidationIssue::AccessDenied);
    }

    for requirement in &descriptor.requirements {
        match requirement {
            Requirement::Field(field) => {
                if !fields.is_present(*field) {
                    verdict.push(ValidationIssue::Missing(*field));
                }
            }
            Requirement::EitherOf { anchor, either } => {
                if !fields.is_present(*anchor) {
                    verdict.push(ValidationIssue::Missing(*anchor));
                }
                if !either.iter().any(|f| fields.is_present(*f)) {
                    verdict.push(ValidationIssue::MissingOneOf(either[0], either[1]));
                }
            }
        }
    }

    verdict
}

/// Boolean form of [`validate`]
pub fn is_submittable(
    descriptor: &ProviderDescriptor,
    fields: &TicketFields,
    has_access_error: bool,
) -> bool {
    validate(descriptor, fields, has_access_error).is_ready()
}
