//! Per-task retry policy with format rescue
//!
//! Each attempt is classified into an explicit outcome so transient and
//! permanent faults stay distinguishable all the way to the logs. The only
//! URL mutation allowed is the one-shot jpg-to-png rescue after a 404 on
//! the default image variant.

use crate::config::AcquisitionConfig;
use crate::fetch::task::{DownloadTask, TaskOutcome};
use crate::output::FailureJournal;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Classified result of a single download attempt
#[derive(Debug)]
enum Attempt {
    /// Body persisted and published to the target path
    Saved,
    /// 404 on a jpg-format URL; the png variant may still exist
    RescueRewrite,
    /// 404 with no rescue available; permanent
    NotFound,
    /// Non-success status worth another attempt after a backoff
    HttpStatus(u16),
    /// Transport-level fault: connect, timeout, or body read
    Transport(String),
    /// Local write fault while persisting the body
    Filesystem(String),
}

/// Runs the full attempt loop for one task
///
/// Up to `max_attempts` tries; a rescue rewrite retries immediately without
/// consuming an attempt or a backoff. Permanent failures are journaled here
/// and reported as [`TaskOutcome::Failed`]. Journal write errors are logged
/// and do not abort the surrounding run.
pub async fn download_with_rescue(
    client: &Client,
    task: &mut DownloadTask,
    config: &AcquisitionConfig,
    journal: &FailureJournal,
) -> TaskOutcome {
    let mut rescued = false;

    while task.attempts < config.max_attempts {
        match attempt(client, &task.current_url, &task.target_path).await {
            Attempt::Saved => return TaskOutcome::Saved,

            Attempt::RescueRewrite if !rescued => {
                tracing::warn!(
                    "[{}] 404 on jpg variant, trying png rescue",
                    task.index
                );
                task.current_url = task.current_url.replace("format=jpg", "format=png");
                rescued = true;
                // Retries immediately: the rescue consumes neither an
                // attempt nor a backoff delay
            }

            Attempt::RescueRewrite | Attempt::NotFound => {
                tracing::error!("[{}] 404 Not Found: {}", task.index, task.current_url);
                record(journal, "404 Not Found", &task.current_url);
                return TaskOutcome::Failed;
            }

            Attempt::HttpStatus(status) => {
                tracing::warn!(
                    "[{}] HTTP {} from {}, backing off {}s",
                    task.index,
                    status,
                    task.current_url,
                    config.backoff_secs
                );
                tokio::time::sleep(Duration::from_secs(config.backoff_secs)).await;
                task.attempts += 1;
            }

            Attempt::Transport(cause) => {
                tracing::warn!(
                    "[{}] transfer fault for {}: {}",
                    task.index,
                    task.current_url,
                    cause
                );
                task.attempts += 1;
            }

            Attempt::Filesystem(cause) => {
                // A bad output path must not sink the other N-1 tasks
                tracing::error!(
                    "[{}] cannot write {}: {}",
                    task.index,
                    task.target_path.display(),
                    cause
                );
                record(journal, "write failed", &task.source_url);
                return TaskOutcome::Failed;
            }
        }
    }

    tracing::error!("[{}] exhausted attempts: {}", task.index, task.source_url);
    record(journal, "download failed", &task.source_url);
    TaskOutcome::Failed
}

/// Performs and classifies one attempt
async fn attempt(client: &Client, url: &str, target: &Path) -> Attempt {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            let cause = if e.is_timeout() {
                format!("timeout: {}", e)
            } else if e.is_connect() {
                format!("connect: {}", e)
            } else {
                e.to_string()
            };
            return Attempt::Transport(cause);
        }
    };

    match response.status().as_u16() {
        200 => persist(response, target).await,
        404 if url.contains("format=jpg") => Attempt::RescueRewrite,
        404 => Attempt::NotFound,
        status => Attempt::HttpStatus(status),
    }
}

/// Writes the body to a temporary sibling and atomically publishes it
///
/// The target path only ever holds complete documents; an interrupted
/// process leaves at worst a stale `.part` file behind.
async fn persist(response: reqwest::Response, target: &Path) -> Attempt {
    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => return Attempt::Transport(format!("body read: {}", e)),
    };

    let part = partial_path(target);
    if let Err(e) = tokio::fs::write(&part, &bytes).await {
        return Attempt::Filesystem(e.to_string());
    }
    if let Err(e) = tokio::fs::rename(&part, target).await {
        return Attempt::Filesystem(e.to_string());
    }
    Attempt::Saved
}

fn partial_path(target: &Path) -> std::path::PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    name.push_str(".part");
    target.with_file_name(name)
}

fn record(journal: &FailureJournal, reason: &str, url: &str) {
    if let Err(e) = journal.record(reason, url) {
        tracing::error!("Failed to journal '{}' for {}: {}", reason, url, e);
    }
}
