//! Acquisition stage: concurrent download of discovered links
//!
//! This module contains:
//! - link file resolution and task construction
//! - the HTTP client used by all workers
//! - the bounded worker pool and per-task retry policy

mod retry;
mod scheduler;
mod task;

pub use scheduler::run_scheduler;
pub use task::{build_tasks, derive_filename, read_link_file, DownloadTask, TaskOutcome, TaskRecord};

use crate::config::AcquisitionConfig;
use crate::output::FailureJournal;
use crate::{MagpieError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Aggregated result of an acquisition run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl AcquisitionReport {
    pub fn total(&self) -> usize {
        self.saved + self.skipped + self.failed
    }
}

/// Builds the HTTP client shared by every download worker
///
/// Connect and idle-read timeouts only; a large video on a slow link must
/// not be killed by an overall duration cap.
pub fn build_http_client(config: &AcquisitionConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .build()?;
    Ok(client)
}

/// Resolves which link file to download from
///
/// An explicitly given path wins; otherwise the newest `*links*.txt` in the
/// working directory (by modification time) is picked up, matching where
/// the discovery stage leaves its output.
pub fn resolve_link_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(MagpieError::LinkFile(format!(
                "{} does not exist",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(".")? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains("links") || !name.ends_with(".txt") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(when, _)| modified > *when) {
            newest = Some((modified, entry.path()));
        }
    }

    newest.map(|(_, path)| path).ok_or_else(|| {
        MagpieError::LinkFile(
            "no *links*.txt in the working directory; run the crawl stage first".to_string(),
        )
    })
}

/// Derives the output directory name from a link file name
///
/// `account_links.txt` and `account_full_links (2).txt` both map to
/// `account`, so re-runs against renamed link files land in one place.
pub fn derive_output_dir(link_file: &Path) -> PathBuf {
    let stem = link_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "downloads".to_string());
    let base = stem
        .split(" (")
        .next()
        .unwrap_or(&stem)
        .trim_end_matches("_full_links")
        .trim_end_matches("_links");
    if base.is_empty() {
        PathBuf::from("downloads")
    } else {
        PathBuf::from(base)
    }
}

/// Runs the complete acquisition stage
///
/// Resolves the link file, preloads the queue, drains it with the worker
/// pool, and aggregates the per-task records into a report.
pub async fn run_acquisition(
    config: &AcquisitionConfig,
    explicit_links: Option<&Path>,
) -> Result<AcquisitionReport> {
    let link_file = resolve_link_file(explicit_links.or(config
        .links_path
        .as_ref()
        .map(Path::new)))?;
    let urls = read_link_file(&link_file)?;
    if urls.is_empty() {
        return Err(MagpieError::LinkFile(format!(
            "{} contains no links",
            link_file.display()
        )));
    }

    let output_dir = config
        .output_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| derive_output_dir(&link_file));
    std::fs::create_dir_all(&output_dir)?;

    tracing::info!(
        "Downloading {} links from {} into {}",
        urls.len(),
        link_file.display(),
        output_dir.display()
    );

    let journal = Arc::new(FailureJournal::open(Path::new(&config.failure_log))?);
    let client = build_http_client(config)?;
    let tasks = build_tasks(&urls, &output_dir);

    let records = run_scheduler(client, tasks, config, journal).await?;

    let mut report = AcquisitionReport::default();
    for record in &records {
        match record.outcome {
            TaskOutcome::Saved => report.saved += 1,
            TaskOutcome::Skipped => report.skipped += 1,
            TaskOutcome::Failed => report.failed += 1,
        }
    }
    Ok(report)
}
