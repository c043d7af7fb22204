//! Ticket types for the investigation workflow.
//!
//! A ticket is created on the agent's side with a local id, shown at once,
//! and later promoted to the id the store assigns. Until then its identity
//! is the natural key (member id + time window).

use crate::duty::DutyId;
use crate::error::DeskError;
use crate::fields::{FieldId, TicketFields};
use crate::helpers::merchant_id_of;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time window used in the natural key when none was entered
pub const NO_TIME_WINDOW: &str = "-";

/// Ephemeral id generated when the agent creates a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(pub Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "local:{}", self.0)
    }
}

/// Id assigned by the ticket store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedId(pub u64);

impl std::fmt::Display for PersistedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TicketId {
    Local(LocalId),
    Persisted(PersistedId),
}

impl TicketId {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    pub fn persisted(&self) -> Option<PersistedId> {
        match self {
            Self::Persisted(id) => Some(*id),
            Self::Local(_) => None,
        }
    }

    pub fn local(&self) -> Option<LocalId> {
        match self {
            Self::Local(id) => Some(*id),
            Self::Persisted(_) => None,
        }
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(id) => write!(f, "{}", id),
            Self::Persisted(id) => write!(f, "{}", id),
        }
    }
}

impl From<PersistedId> for TicketId {
    fn from(id: PersistedId) -> Self {
        Self::Persisted(id)
    }
}

impl From<LocalId> for TicketId {
    fn from(id: LocalId) -> Self {
        Self::Local(id)
    }
}

/// Ticket status; names match the store's enum exactly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    Pending,
    Normal,
    Abnormal,
    Handover,
}

impl TicketStatus {
    /// Normal and Abnormal are final
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Normal | Self::Abnormal)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Normal => write!(f, "Normal"),
            Self::Abnormal => write!(f, "Abnormal"),
            Self::Handover => write!(f, "Handover"),
        }
    }
}

/// Completion outcome chosen by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Normal,
    /// Provider confirmed abnormal betting of this type (e.g. "Arbitrage")
    Abnormal(String),
}

/// Identity of a ticket before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub member_id: String,
    pub time_window: String,
}

/// What the agent submits from the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketForm {
    pub provider: String,
    pub fields: TicketFields,
}

impl TicketForm {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            fields: TicketFields::new(),
        }
    }

    pub fn with(mut self, field: FieldId, value: impl Into<String>) -> Self {
        self.fields.set(field, value);
        self
    }

    pub fn member_id(&self) -> &str {
        self.fields.value(FieldId::MemberId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub member_id: String,
    /// Merchant code taken from the member id, "-" for house members
    pub merchant_id: String,
    pub provider: String,
    /// Duty the ticket was logged under
    pub duty: DutyId,
    /// Work name of the agent who logged it
    pub recorder: String,
    #[serde(default)]
    pub fields: TicketFields,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abnormal_type: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Optimistic ticket built from the form, with a fresh local id
    pub fn draft(form: &TicketForm, duty: DutyId, recorder: &str, now: DateTime<Utc>) -> Self {
        let member_id = form.member_id().to_string();
        Self {
            id: TicketId::Local(LocalId::new()),
            merchant_id: merchant_id_of(&member_id),
            member_id,
            provider: form.provider.clone(),
            duty,
            recorder: recorder.to_string(),
            fields: form.fields.clone(),
            status: TicketStatus::Pending,
            abnormal_type: None,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            member_id: self.member_id.trim().to_string(),
            time_window: self
                .fields
                .get(FieldId::TimeRange)
                .unwrap_or(NO_TIME_WINDOW)
                .to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Patch that completes this ticket.
    /// Completed tickets are immutable; abnormal needs a non-blank type.
    pub fn completion_patch(
        &self,
        completion: &Completion,
        now: DateTime<Utc>,
    ) -> Result<TicketPatch, DeskError> {
        if self.is_completed() {
            return Err(DeskError::AlreadyCompleted(self.id));
        }
        let patch = match completion {
            Completion::Normal => TicketPatch::status(TicketStatus::Normal),
            Completion::Abnormal(kind) => {
                let kind = kind.trim();
                if kind.is_empty() {
                    return Err(DeskError::MissingAbnormalType);
                }
                TicketPatch {
                    abnormal_type: Some(kind.to_string()),
                    ..TicketPatch::status(TicketStatus::Abnormal)
                }
            }
        };
        Ok(TicketPatch {
            completed_at: Some(now),
            ..patch
        })
    }

    /// Case-insensitive match on member id, provider account or tracking id
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let hit = |value: &str| value.to_lowercase().contains(&term);
        hit(&self.member_id)
            || hit(self.fields.value(FieldId::ProviderAccount))
            || hit(self.fields.value(FieldId::TrackingId))
    }
}

/// Filter tickets by search term, keeping order
pub fn search<'a>(tickets: &'a [Ticket], term: &str) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| t.matches_search(term)).collect()
}

/// Partial update sent to the store and applied locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    /// Values overlaid onto the ticket's fields
    #[serde(default, skip_serializing_if = "TicketFields::is_empty")]
    pub fields: TicketFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abnormal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TicketPatch {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Edit of member id and time window, the two fields agents correct
    pub fn edit(member_id: impl Into<String>, time_range: impl Into<String>) -> Self {
        Self {
            member_id: Some(member_id.into()),
            fields: TicketFields::new().with(FieldId::TimeRange, time_range),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, ticket: &mut Ticket) {
        if let Some(member_id) = &self.member_id {
            ticket.member_id = member_id.clone();
            ticket.merchant_id = merchant_id_of(member_id);
            ticket.fields.set(FieldId::MemberId, member_id.clone());
        }
        ticket.fields.merge(&self.fields);
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(kind) = &self.abnormal_type {
            ticket.abnormal_type = Some(kind.clone());
        }
        if let Some(at) = self.completed_at {
            ticket.completed_at = Some(at);
        }
    }
}
