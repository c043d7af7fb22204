//! Clipboard sink for rendered scripts.
//!
//! Copies are fire-and-forget: a failing sink is logged and never turns
//! into a desk error. Placeholders are never copied.

use anyhow::{anyhow, Result};
use riskdesk_shared::scripts::is_placeholder;
use std::sync::Mutex;
use tracing::{debug, warn};

pub trait ClipboardSink: Send + Sync {
    fn write(&self, text: &str) -> Result<()>;
}

/// Copy `text` unless it is a placeholder. Returns whether the sink took it.
pub fn copy_script(sink: &dyn ClipboardSink, text: &str) -> bool {
    if is_placeholder(text) {
        debug!("Skipping clipboard copy of placeholder");
        return false;
    }
    match sink.write(text) {
        Ok(()) => true,
        Err(e) => {
            warn!("Clipboard write failed: {}", e);
            false
        }
    }
}

/// Sink that drops everything; for embedders without a clipboard
#[derive(Debug, Default)]
pub struct NullClipboard;

impl ClipboardSink for NullClipboard {
    fn write(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Sink that records every write, optionally failing them
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    writes: Mutex<Vec<String>>,
    failing: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.writes().pop()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn write(&self, text: &str) -> Result<()> {
        if self.failing {
            return Err(anyhow!("clipboard unavailable"));
        }
        self.writes
            .lock()
            .map_err(|_| anyhow!("clipboard lock poisoned"))?
            .push(text.to_string());
        Ok(())
    }
}

impl<S: ClipboardSink + ?Sized> ClipboardSink for std::sync::Arc<S> {
    fn write(&self, text: &str) -> Result<()> {
        (**self).write(text)
    }
}
