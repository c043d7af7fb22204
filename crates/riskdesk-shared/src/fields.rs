//! Ticket form fields.
//!
//! Every value an agent can type or pick on the ticket form is keyed by a
//! closed `FieldId`. "Present" always means non-blank after trimming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Form field identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    /// Player identifier, optionally suffixed with `@<merchant code>`
    MemberId,
    /// Back-office login id
    LoginId,
    /// Player account on the provider side
    ProviderAccount,
    /// Provider tracking / transaction id
    TrackingId,
    /// Betting time window, free text (e.g. "10:00 - 12:00")
    TimeRange,
    Currency,
    ReasonToCheck,
    GameName,
    BetTicket,
    RoundId,
}

impl FieldId {
    pub const ALL: [FieldId; 10] = [
        FieldId::MemberId,
        FieldId::LoginId,
        FieldId::ProviderAccount,
        FieldId::TrackingId,
        FieldId::TimeRange,
        FieldId::Currency,
        FieldId::ReasonToCheck,
        FieldId::GameName,
        FieldId::BetTicket,
        FieldId::RoundId,
    ];

    /// Human label used in placeholders and validation messages
    pub fn label(self) -> &'static str {
        match self {
            Self::MemberId => "Member ID",
            Self::LoginId => "Login ID",
            Self::ProviderAccount => "Provider Account",
            Self::TrackingId => "Tracking ID",
            Self::TimeRange => "Time Range",
            Self::Currency => "Currency",
            Self::ReasonToCheck => "Reason to Check",
            Self::GameName => "Game Name",
            Self::BetTicket => "Bet Ticket",
            Self::RoundId => "Round ID",
        }
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Field values of a ticket or of the form being filled in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketFields(BTreeMap<FieldId, String>);

impl TicketFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: FieldId, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn remove(&mut self, field: FieldId) -> Option<String> {
        self.0.remove(&field)
    }

    /// Raw value as typed, if any
    pub fn raw(&self, field: FieldId) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Trimmed value, `None` when absent or blank
    pub fn get(&self, field: FieldId) -> Option<&str> {
        self.raw(field).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Trimmed value or an empty string
    pub fn value(&self, field: FieldId) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn is_present(&self, field: FieldId) -> bool {
        self.get(field).is_some()
    }

    /// Overlay every value of `other` onto `self`
    pub fn merge(&mut self, other: &TicketFields) {
        for (field, value) in &other.0 {
            self.0.insert(*field, value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(FieldId, String)> for TicketFields {
    fn from_iter<T: IntoIterator<Item = (FieldId, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
