//! Duty queues and the merchant directory entry they own.
//!
//! Agents work "as" one duty per session. IC0 is the supervisor duty and
//! sees every queue; IC1..IC5 are peers with no access to each other's
//! merchants.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Duty queue tag.
/// Order is pinned for deterministic serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DutyId {
    /// Supervisor duty, bypasses all access checks
    #[serde(rename = "IC0")]
    Ic0,
    #[serde(rename = "IC1")]
    Ic1,
    #[serde(rename = "IC2")]
    Ic2,
    #[serde(rename = "IC3")]
    Ic3,
    #[serde(rename = "IC4")]
    Ic4,
    #[serde(rename = "IC5")]
    Ic5,
}

impl DutyId {
    /// All duties in pinned order
    pub const ALL: [DutyId; 6] = [
        DutyId::Ic0,
        DutyId::Ic1,
        DutyId::Ic2,
        DutyId::Ic3,
        DutyId::Ic4,
        DutyId::Ic5,
    ];

    /// The supervisor duty
    pub const SUPERUSER: DutyId = DutyId::Ic0;

    pub fn is_superuser(self) -> bool {
        self == Self::SUPERUSER
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ic0 => "IC0",
            Self::Ic1 => "IC1",
            Self::Ic2 => "IC2",
            Self::Ic3 => "IC3",
            Self::Ic4 => "IC4",
            Self::Ic5 => "IC5",
        }
    }
}

impl std::fmt::Display for DutyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for duty tags that are not IC0..IC5
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown duty tag: {0}")]
pub struct UnknownDuty(pub String);

impl FromStr for DutyId {
    type Err = UnknownDuty;

    /// Case-insensitive; the directory sync upper-cases tags but hand-typed
    /// sheets do not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        DutyId::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == tag)
            .ok_or_else(|| UnknownDuty(s.to_string()))
    }
}

/// One merchant row from the duty directory.
/// Immutable once loaded; the directory replaces its full set on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Merchant code as it appears after the member id delimiter (e.g. "017")
    pub identifier: String,
    /// Merchant display name
    pub display_name: String,
    /// Duty queue that owns the merchant
    pub owning_duty: DutyId,
}

impl DirectoryEntry {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        owning_duty: DutyId,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            owning_duty,
        }
    }
}

/// Advisory access check.
///
/// Returns the message shown under the member id field when `acting` may
/// not submit for a merchant owned by `owner`. The supervisor duty is
/// always allowed.
pub fn access_error(acting: DutyId, owner: DutyId, owner_name: &str) -> Option<String> {
    if acting.is_superuser() || acting == owner {
        return None;
    }
    Some(format!("Access Denied: {} is under {}.", owner_name, owner))
}
