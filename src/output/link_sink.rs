//! Append-only stream of discovered links
//!
//! Every canonical URL is written and flushed the moment it is discovered,
//! so an interrupted crawl loses at most the in-flight item.

use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable, append-only sink for discovered media links
///
/// One canonical URL per line. Append order is discovery order, which later
/// becomes the download order of the acquisition stage.
pub struct LinkSink {
    file: File,
    path: PathBuf,
    written: usize,
}

impl LinkSink {
    /// Opens a sink at the given path, appending to any existing content
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            written: 0,
        })
    }

    /// Appends one URL and flushes it to disk immediately
    pub fn append(&mut self, url: &str) -> Result<()> {
        writeln!(self.file, "{}", url)?;
        self.file.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Returns the number of URLs appended through this sink
    pub fn written(&self) -> usize {
        self.written
    }

    /// Returns the path this sink writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Picks a path that does not collide with an existing file
///
/// Returns `base` unchanged when it is free, otherwise inserts a ` (n)`
/// counter before the extension, matching the naming of earlier runs
/// sitting in the same directory.
pub fn unique_path(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = base.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{} ({}){}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
