//! Bounded worker pool draining the download queue
//!
//! All N tasks are preloaded into one FIFO queue in link order; W workers
//! pull from it until it runs dry. Queue membership is already unique, so
//! no per-URL locking exists — exactly one worker ever owns a task.

use crate::config::AcquisitionConfig;
use crate::fetch::retry::download_with_rescue;
use crate::fetch::task::{DownloadTask, TaskOutcome, TaskRecord};
use crate::output::FailureJournal;
use crate::Result;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Runs every task to a terminal outcome and returns the records
///
/// Returns once each of the N tasks has been marked exactly once as saved,
/// skipped, or failed; workers stop on queue exhaustion.
pub async fn run_scheduler(
    client: Client,
    tasks: Vec<DownloadTask>,
    config: &AcquisitionConfig,
    journal: Arc<FailureJournal>,
) -> Result<Vec<TaskRecord>> {
    let total = tasks.len();
    let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
    let records = Arc::new(Mutex::new(Vec::with_capacity(total)));

    let workers: Vec<_> = (0..config.concurrency)
        .map(|worker_id| {
            let client = client.clone();
            let queue = Arc::clone(&queue);
            let records = Arc::clone(&records);
            let journal = Arc::clone(&journal);
            let config = config.clone();
            tokio::spawn(async move {
                worker_loop(worker_id, client, queue, records, &config, &journal, total).await;
            })
        })
        .collect();

    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!("Download worker panicked: {}", e);
        }
    }

    let mut records = records
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(records.drain(..).collect())
}

/// One worker: dequeue, resolve, record, repeat until the queue is empty
async fn worker_loop(
    worker_id: usize,
    client: Client,
    queue: Arc<Mutex<VecDeque<DownloadTask>>>,
    records: Arc<Mutex<Vec<TaskRecord>>>,
    config: &AcquisitionConfig,
    journal: &FailureJournal,
    total: usize,
) {
    tracing::debug!("Worker {} started", worker_id);

    loop {
        let task = {
            let mut queue = queue
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            queue.pop_front()
        };
        let Some(mut task) = task else {
            break;
        };

        let outcome = process_task(&client, &mut task, config, journal, total).await;

        let record = TaskRecord {
            index: task.index,
            url: task.source_url.clone(),
            outcome,
        };
        records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    tracing::debug!("Worker {} finished", worker_id);
}

/// Resolves one task: idempotent skip, then the retry policy
async fn process_task(
    client: &Client,
    task: &mut DownloadTask,
    config: &AcquisitionConfig,
    journal: &FailureJournal,
    total: usize,
) -> TaskOutcome {
    let percent = (task.index * 100) / total.max(1);

    if tokio::fs::try_exists(&task.target_path).await.unwrap_or(false) {
        tracing::debug!(
            "[{}/{}] already present: {}",
            task.index,
            total,
            task.target_path.display()
        );
        return TaskOutcome::Skipped;
    }

    let outcome = download_with_rescue(client, task, config, journal).await;
    if outcome == TaskOutcome::Saved {
        tracing::info!(
            "[{}/{}] {}% done: {}",
            task.index,
            total,
            percent,
            task.target_path.display()
        );
    }
    outcome
}
