//! Duty resolver: member id -> owning merchant and access verdict.
//!
//! Resolution is total. Unknown merchants and house members fall back to
//! the house merchant without an error; only a known merchant owned by a
//! different duty produces an access error, and that error is advisory.

use crate::config::ResolverConfig;
use crate::directory::DutyDirectory;
use riskdesk_shared::duty::{access_error, DirectoryEntry, DutyId};
use riskdesk_shared::helpers::{merchant_suffix, pad_code};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Result of resolving a member id for the acting duty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Merchant name shown under the member id; empty for blank input
    pub owner_name: String,
    /// Duty owning the merchant, when the directory knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_duty: Option<DutyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_error: Option<String>,
}

impl Resolution {
    pub fn has_access_error(&self) -> bool {
        self.access_error.is_some()
    }
}

pub struct DutyResolver {
    directory: Arc<DutyDirectory>,
    config: ResolverConfig,
}

impl DutyResolver {
    pub fn new(directory: Arc<DutyDirectory>, config: ResolverConfig) -> Self {
        Self { directory, config }
    }

    pub fn directory(&self) -> &Arc<DutyDirectory> {
        &self.directory
    }

    /// Resolve `raw_member_id` for an agent working as `acting`
    pub fn resolve(&self, raw_member_id: &str, acting: DutyId) -> Resolution {
        if raw_member_id.trim().is_empty() {
            return Resolution::default();
        }

        let Some(suffix) = merchant_suffix(raw_member_id, self.config.delimiter) else {
            return self.house_resolution();
        };

        match self.lookup(suffix) {
            Some(entry) => {
                let error = access_error(acting, entry.owning_duty, &entry.display_name);
                debug!(
                    "Resolved {} -> {} ({}), access error: {}",
                    raw_member_id,
                    entry.display_name,
                    entry.owning_duty,
                    error.is_some()
                );
                Resolution {
                    owner_name: entry.display_name,
                    owning_duty: Some(entry.owning_duty),
                    access_error: error,
                }
            }
            None => {
                debug!("No directory entry for {}, using house merchant", suffix);
                self.house_resolution()
            }
        }
    }

    /// Padded lookup: primary width first, then the alternate width
    fn lookup(&self, suffix: &str) -> Option<DirectoryEntry> {
        let pad = self.config.pad_char;
        let primary = pad_code(suffix, pad, self.config.key_width);
        self.directory.find_by_identifier(&primary).or_else(|| {
            let alternate = pad_code(suffix, pad, self.config.alternate_key_width);
            if alternate == primary {
                return None;
            }
            self.directory.find_by_identifier(&alternate)
        })
    }

    /// House merchant owner, never an access error
    fn house_resolution(&self) -> Resolution {
        let house = &self.config.house_merchant;
        Resolution {
            owner_name: house.clone(),
            owning_duty: self.directory.find_by_name(house).map(|e| e.owning_duty),
            access_error: None,
        }
    }
}
