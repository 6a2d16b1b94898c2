//! Download task model and filename derivation

use crate::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// One unit of acquisition work
///
/// A task is owned exclusively by the worker that dequeued it and is never
/// re-enqueued. `current_url` starts equal to `source_url` and diverges at
/// most once, through the jpg-to-png rescue rewrite.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// 1-based position in the original link order
    pub index: usize,
    /// URL as read from the link file
    pub source_url: String,
    /// URL the next attempt will fetch
    pub current_url: String,
    /// Final destination of the downloaded body
    pub target_path: PathBuf,
    /// Attempts consumed so far; rescue rewrites do not count
    pub attempts: u32,
}

/// Terminal status of a task after the scheduler ran it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Body downloaded and published to the target path
    Saved,
    /// Target already existed; no network activity happened
    Skipped,
    /// Permanent failure, recorded in the journal
    Failed,
}

/// Outcome of one task, kept for the completion report
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub index: usize,
    pub url: String,
    pub outcome: TaskOutcome,
}

/// Reads a link file into an ordered list of URLs
///
/// One absolute URL per line; blank lines are ignored.
pub fn read_link_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Builds the task list for a run, indices contiguous from 1
pub fn build_tasks(urls: &[String], output_dir: &Path) -> Vec<DownloadTask> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            let index = i + 1;
            let name = derive_filename(url, index);
            DownloadTask {
                index,
                source_url: url.clone(),
                current_url: url.clone(),
                target_path: output_dir.join(name),
                attempts: 0,
            }
        })
        .collect()
}

/// Derives a deterministic local filename from a media URL
///
/// Image URLs (recognizable by their `format=` query) map to the media
/// identifier in the path forced to `.jpg`, so the same asset lands on the
/// same name whether the jpg or the rescued png variant ends up served.
/// Video URLs keep their final path segment with the query stripped. URLs
/// that defeat derivation fall back to a sequence-indexed name.
pub fn derive_filename(url: &str, index: usize) -> String {
    derive_from_url(url).unwrap_or_else(|| format!("file_{}.dat", index))
}

fn derive_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .to_string();
    if segment.is_empty() {
        return None;
    }

    if parsed.query().is_some_and(|q| q.contains("format=")) {
        let stem = segment
            .strip_suffix(".jpg")
            .or_else(|| segment.strip_suffix(".png"))
            .unwrap_or(&segment);
        Some(format!("{}.jpg", stem))
    } else {
        Some(segment)
    }
}
