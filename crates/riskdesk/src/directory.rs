//! Duty directory: merchant identifier -> owning duty.
//!
//! The directory is an exported sheet with one (identifier, name) column
//! pair per duty. It is loaded once and can be refreshed; a refresh swaps
//! the whole snapshot so readers never see a partial set.

use crate::config::DirectoryConfig;
use anyhow::{anyhow, Result};
use riskdesk_shared::duty::{DirectoryEntry, DutyId};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Header cell that repeats inside the sheet body
const HEADER_CELL: &str = "ID";

/// Where the raw directory text comes from
pub trait DirectorySource: Send + Sync {
    fn fetch(&self) -> Result<String>;
}

impl<S: DirectorySource + ?Sized> DirectorySource for Arc<S> {
    fn fetch(&self) -> Result<String> {
        (**self).fetch()
    }
}

/// Reads the exported sheet from disk
pub struct FileDirectorySource {
    path: PathBuf,
}

impl FileDirectorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DirectorySource for FileDirectorySource {
    fn fetch(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .map_err(|e| anyhow!("Failed to read {}: {}", self.path.display(), e))
    }
}

/// In-memory sheet; `None` behaves like an unreachable source
#[derive(Default)]
pub struct StaticDirectorySource {
    text: Mutex<Option<String>>,
}

impl StaticDirectorySource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Replace the sheet served by later fetches
    pub fn set(&self, text: Option<String>) {
        match self.text.lock() {
            Ok(mut guard) => *guard = text,
            Err(poisoned) => *poisoned.into_inner() = text,
        }
    }
}

impl DirectorySource for StaticDirectorySource {
    fn fetch(&self) -> Result<String> {
        let guard = self
            .text
            .lock()
            .map_err(|_| anyhow!("Directory source lock poisoned"))?;
        guard
            .clone()
            .ok_or_else(|| anyhow!("Directory source unavailable"))
    }
}

/// Sheet layout: rows to skip and the duty of each column pair
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub header_rows: usize,
    pub column_duties: Vec<DutyId>,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        DirectoryLayout::from(&DirectoryConfig::default())
    }
}

impl From<&DirectoryConfig> for DirectoryLayout {
    fn from(config: &DirectoryConfig) -> Self {
        Self {
            header_rows: config.header_rows,
            column_duties: config.column_duties.clone(),
        }
    }
}

/// Parse the exported sheet into entries, row-major.
///
/// Strips a leading BOM and carriage returns, drops the header rows, and
/// reads one (identifier, name) pair per configured duty. Pairs with a
/// blank cell or a repeated header are skipped; short rows yield only the
/// pairs they contain.
pub fn parse_directory(text: &str, layout: &DirectoryLayout) -> Vec<DirectoryEntry> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = text.replace('\r', "");

    let mut entries = Vec::new();
    for row in text.split('\n').skip(layout.header_rows) {
        let cols: Vec<&str> = row.split(',').map(str::trim).collect();
        for (pair, duty) in layout.column_duties.iter().enumerate() {
            let (Some(id), Some(name)) = (cols.get(pair * 2), cols.get(pair * 2 + 1)) else {
                continue;
            };
            if id.is_empty() || name.is_empty() || *id == HEADER_CELL {
                continue;
            }
            entries.push(DirectoryEntry::new(*id, *name, *duty));
        }
    }
    entries
}

/// Outcome of a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRefresh {
    /// Snapshot swapped; number of entries now active
    Replaced(usize),
    /// Source unreachable; previous snapshot kept
    Unavailable,
}

/// Immutable set of entries with an identifier index
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    entries: Vec<DirectoryEntry>,
    by_identifier: HashMap<String, usize>,
}

impl DirectorySnapshot {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        let mut by_identifier = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            // First occurrence wins
            by_identifier.entry(entry.identifier.clone()).or_insert(i);
        }
        Self {
            entries,
            by_identifier,
        }
    }

    pub fn find_by_identifier(&self, key: &str) -> Option<&DirectoryEntry> {
        self.by_identifier.get(key).map(|&i| &self.entries[i])
    }

    pub fn find_by_name(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.display_name == name)
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct DutyDirectory {
    source: Box<dyn DirectorySource>,
    layout: DirectoryLayout,
    snapshot: RwLock<Arc<DirectorySnapshot>>,
}

impl DutyDirectory {
    /// Empty directory; call [`DutyDirectory::refresh`] to populate it
    pub fn new(source: Box<dyn DirectorySource>, layout: DirectoryLayout) -> Self {
        Self {
            source,
            layout,
            snapshot: RwLock::new(Arc::new(DirectorySnapshot::default())),
        }
    }

    /// File-backed directory from config, loaded once
    pub fn from_config(config: &DirectoryConfig) -> Self {
        let directory = Self::new(
            Box::new(FileDirectorySource::new(&config.source_path)),
            DirectoryLayout::from(config),
        );
        directory.refresh();
        directory
    }

    /// Fetch and parse the source. Unreachable source -> empty list.
    pub fn load(&self) -> Vec<DirectoryEntry> {
        match self.source.fetch() {
            Ok(text) => parse_directory(&text, &self.layout),
            Err(e) => {
                warn!("Duty directory unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Reload and swap the snapshot wholesale
    pub fn refresh(&self) -> DirectoryRefresh {
        let text = match self.source.fetch() {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Duty directory refresh failed, keeping previous snapshot: {}",
                    e
                );
                return DirectoryRefresh::Unavailable;
            }
        };

        let snapshot = Arc::new(DirectorySnapshot::new(parse_directory(&text, &self.layout)));
        let count = snapshot.len();
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        info!("Duty directory loaded: {} entries", count);
        DirectoryRefresh::Replaced(count)
    }

    /// Current snapshot; stays valid across later refreshes
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Exact identifier match
    pub fn find_by_identifier(&self, key: &str) -> Option<DirectoryEntry> {
        let found = self.snapshot().find_by_identifier(key).cloned();
        debug!("Directory lookup {:?}: {}", key, found.is_some());
        found
    }

    pub fn find_by_name(&self, name: &str) -> Option<DirectoryEntry> {
        self.snapshot().find_by_name(name).cloned()
    }
}
