//! Configuration management for the desk.
//!
//! Loads settings from /etc/riskdesk/config.toml or uses defaults.

use anyhow::Result;
use riskdesk_shared::duty::DutyId;
use riskdesk_shared::helpers::MEMBER_DELIMITER;
use riskdesk_shared::{DEFAULT_ACTOR_NAME, HOUSE_MERCHANT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/riskdesk/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/riskdesk/config.toml";

/// Session defaults for the desk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Work name used when the agent's email is unknown
    #[serde(default = "default_actor_fallback")]
    pub actor_fallback: String,

    /// Duty an agent works as until they pick one
    #[serde(default = "default_duty")]
    pub default_duty: DutyId,
}

fn default_actor_fallback() -> String {
    DEFAULT_ACTOR_NAME.to_string()
}

fn default_duty() -> DutyId {
    DutyId::Ic1
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            actor_fallback: default_actor_fallback(),
            default_duty: default_duty(),
        }
    }
}

/// Duty directory source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Exported directory sheet
    #[serde(default = "default_source_path")]
    pub source_path: String,

    /// Rows skipped at the top of the sheet
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,

    /// Duty owning each (identifier, name) column pair, left to right
    #[serde(default = "default_column_duties")]
    pub column_duties: Vec<DutyId>,
}

fn default_source_path() -> String {
    "/var/lib/riskdesk/directory.csv".to_string()
}

fn default_header_rows() -> usize {
    2
}

fn default_column_duties() -> Vec<DutyId> {
    // IC4 has no column in the sheet
    vec![DutyId::Ic1, DutyId::Ic2, DutyId::Ic3, DutyId::Ic5]
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            header_rows: default_header_rows(),
            column_duties: default_column_duties(),
        }
    }
}

/// Member id parsing and merchant lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_pad_char")]
    pub pad_char: char,

    /// Width merchant codes are padded to before lookup
    #[serde(default = "default_key_width")]
    pub key_width: usize,

    /// Width tried when the first lookup misses
    #[serde(default = "default_alternate_key_width")]
    pub alternate_key_width: usize,

    /// Owner of member ids without a merchant suffix
    #[serde(default = "default_house_merchant")]
    pub house_merchant: String,
}

fn default_delimiter() -> char {
    MEMBER_DELIMITER
}

fn default_pad_char() -> char {
    '0'
}

fn default_key_width() -> usize {
    3
}

fn default_alternate_key_width() -> usize {
    4
}

fn default_house_merchant() -> String {
    HOUSE_MERCHANT.to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            pad_char: default_pad_char(),
            key_width: default_key_width(),
            alternate_key_width: default_alternate_key_width(),
            house_merchant: default_house_merchant(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub desk: DeskConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.desk.actor_fallback, "RiskOps");
        assert_eq!(config.directory.header_rows, 2);
        assert_eq!(
            config.directory.column_duties,
            vec![DutyId::Ic1, DutyId::Ic2, DutyId::Ic3, DutyId::Ic5]
        );
        assert_eq!(config.resolver.delimiter, '@');
        assert_eq!(config.resolver.key_width, 3);
        assert_eq!(config.resolver.alternate_key_width, 4);
        assert_eq!(config.resolver.house_merchant, "QQ288");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[desk]
default_duty = "IC0"

[directory]
source_path = "/tmp/duties.csv"
column_duties = ["IC1", "IC4"]

[resolver]
key_width = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.desk.default_duty, DutyId::Ic0);
        assert_eq!(config.directory.source_path, "/tmp/duties.csv");
        assert_eq!(
            config.directory.column_duties,
            vec![DutyId::Ic1, DutyId::Ic4]
        );
        assert_eq!(config.resolver.key_width, 4);
        // Defaults for missing fields
        assert_eq!(config.directory.header_rows, 2);
        assert_eq!(config.resolver.pad_char, '0');
        assert_eq!(config.desk.actor_fallback, "RiskOps");
    }

    #[test]
    fn test_empty_sections_use_defaults() {
        let config: Config = toml::from_str("[resolver]\n").unwrap();
        assert_eq!(config.resolver.house_merchant, "QQ288");
    }

    #[test]
    fn test_save_and_load_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::save_default(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.resolver.alternate_key_width, 4);
        assert_eq!(loaded.directory.column_duties.len(), 4);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_path(dir.path().join("absent.toml")).is_err());
    }
}
