//! Append-only journal of permanent download failures

use crate::Result;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Durable log of permanent failures, one `[timestamp] reason: url` line each
///
/// The journal is shared across download workers; the internal mutex keeps
/// writes serialized so lines never interleave.
pub struct FailureJournal {
    file: Mutex<File>,
}

impl FailureJournal {
    /// Opens a journal at the given path, appending to any existing content
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Records one permanent failure
    pub fn record(&self, reason: &str, url: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "[{}] {}: {}", timestamp, reason, url)?;
        file.flush()?;
        Ok(())
    }
}
