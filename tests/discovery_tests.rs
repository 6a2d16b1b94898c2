//! Integration tests for the discovery stage
//!
//! The crawl state machines run against a scripted page driver that emits
//! canned API responses per scroll and answers status probes from a queue,
//! covering stall termination, strategy selection, and deep-drill crash
//! recovery without a real browser.

use async_trait::async_trait;
use magpie::browser::{response_channel, ApiResponse, PageDriver, PageStatus, ResponseSender};
use magpie::config::DiscoveryConfig;
use magpie::crawl::{
    run_deep_drill, run_discovery, run_fast_scroll, CrawlSession, CrawlStrategy,
};
use magpie::output::LinkSink;
use std::collections::VecDeque;
use std::path::Path;

/// Page driver that replays a script instead of driving a browser
struct ScriptedDriver {
    tx: ResponseSender,
    /// Responses emitted per scroll-to-bottom, consumed front to back
    batches: VecDeque<Vec<ApiResponse>>,
    /// Status answers, consumed front to back; Ok once exhausted
    statuses: VecDeque<PageStatus>,
    navigations: Vec<String>,
    bottom_scrolls: usize,
    lifts: usize,
    reloads: usize,
}

impl ScriptedDriver {
    fn new(tx: ResponseSender) -> Self {
        Self {
            tx,
            batches: VecDeque::new(),
            statuses: VecDeque::new(),
            navigations: Vec::new(),
            bottom_scrolls: 0,
            lifts: 0,
            reloads: 0,
        }
    }

    fn push_batch(&mut self, responses: Vec<ApiResponse>) {
        self.batches.push_back(responses);
    }

    fn push_statuses(&mut self, statuses: &[PageStatus]) {
        self.statuses.extend(statuses.iter().copied());
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&mut self, url: &str) -> magpie::Result<()> {
        self.navigations.push(url.to_string());
        Ok(())
    }

    async fn reload(&mut self) -> magpie::Result<()> {
        self.reloads += 1;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> magpie::Result<()> {
        self.bottom_scrolls += 1;
        if let Some(batch) = self.batches.pop_front() {
            for response in batch {
                let _ = self.tx.send(response);
            }
        }
        Ok(())
    }

    async fn scroll_by(&mut self, _delta_y: i64) -> magpie::Result<()> {
        self.lifts += 1;
        Ok(())
    }

    async fn status(&mut self) -> magpie::Result<PageStatus> {
        Ok(self.statuses.pop_front().unwrap_or(PageStatus::Ok))
    }

    async fn current_url(&mut self) -> magpie::Result<String> {
        Ok(self
            .navigations
            .last()
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string()))
    }
}

/// Fast test configuration: tiny delays, production-shaped thresholds
fn test_config(handle: &str) -> DiscoveryConfig {
    DiscoveryConfig {
        handle: handle.to_string(),
        threshold_count: 800,
        assume_large: false,
        settle_delay_secs: 0.01,
        fast_jiggle_strikes: 3,
        fast_finish_strikes: 5,
        deep_jiggle_strikes: 2,
        deep_finish_strikes: 4,
        max_iterations: 50,
        cooldown_secs: 0,
        reload_settle_secs: 0,
        max_consecutive_crashes: 5,
        jitter_min_secs: 0.0,
        jitter_max_secs: 0.0,
        start_year: 2024,
        end_year: 2024,
        links_path: None,
        user_data_dir: "./unused".to_string(),
        login_wait_secs: 1,
    }
}

fn media_response(urls: &[&str]) -> ApiResponse {
    let entries: Vec<serde_json::Value> = urls
        .iter()
        .map(|u| serde_json::json!({"media_url_https": u}))
        .collect();
    ApiResponse {
        url: "https://x.test/api/UserMedia".to_string(),
        status: 200,
        body: serde_json::json!({"timeline": entries}).to_string(),
    }
}

fn probe_response(count: u64) -> ApiResponse {
    ApiResponse {
        url: "https://x.test/api/UserByScreenName".to_string(),
        status: 200,
        body: serde_json::json!({
            "data": {"user": {"result": {"legacy": {"media_count": count}}}}
        })
        .to_string(),
    }
}

fn session_in(dir: &Path) -> (CrawlSession, ResponseSender) {
    let (tx, rx) = response_channel();
    let sink = LinkSink::open(&dir.join("links.txt")).unwrap();
    (CrawlSession::new(sink, rx), tx)
}

#[tokio::test]
async fn test_fast_scroll_collects_until_stalled() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    driver.push_batch(vec![media_response(&[
        "https://pbs.test/media/a.jpg",
        "https://pbs.test/media/b.jpg",
    ])]);
    driver.push_batch(vec![media_response(&["https://pbs.test/media/c.jpg"])]);
    // Nothing more: the feed is exhausted

    let config = test_config("small_account");
    run_fast_scroll(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(session.candidate_count(), 3);
    assert_eq!(driver.lifts, 1, "exactly one corrective jiggle");

    let content = std::fs::read_to_string(dir.path().join("links.txt")).unwrap();
    assert_eq!(content.lines().count(), 3);
}

#[tokio::test]
async fn test_fast_scroll_stall_termination_count() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);
    // No batches at all: every sample observes the same count

    let config = test_config("empty_account");
    run_fast_scroll(&mut driver, &mut session, &config)
        .await
        .unwrap();

    // Five stalled samples, plus the one bottom-scroll the jiggle issues
    assert_eq!(driver.bottom_scrolls, 6);
    assert_eq!(driver.lifts, 1);
}

#[tokio::test]
async fn test_fast_scroll_respects_iteration_bound() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    // A pathological feed that always produces one new item per scroll
    for i in 0..200 {
        driver.push_batch(vec![media_response(&[&format!(
            "https://pbs.test/media/item{}.jpg",
            i
        )])]);
    }

    let mut config = test_config("endless_account");
    config.max_iterations = 10;
    run_fast_scroll(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(session.candidate_count(), 10, "bounded by max_iterations");
}

#[tokio::test]
async fn test_deep_drill_visits_every_month_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    // Every window is empty on entry
    driver.push_statuses(&[PageStatus::Empty; 12]);

    let config = test_config("huge_account");
    run_deep_drill(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(driver.navigations.len(), 12);
    assert!(driver.navigations[0].contains("since%3A2024-12-01"));
    assert!(driver.navigations[0].contains("until%3A2024-12-31"));
    assert!(driver.navigations[11].contains("since%3A2024-01-01"));
    assert_eq!(session.candidate_count(), 0);
    assert_eq!(driver.bottom_scrolls, 0, "empty windows are never scrolled");
}

#[tokio::test]
async fn test_deep_drill_crash_mid_scroll_resumes_same_window() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    // December: fine on entry, one crash during scrolling, then stalls out.
    // All other months are empty.
    driver.push_statuses(&[
        PageStatus::Ok,    // window entry
        PageStatus::Crash, // first scroll: crash, reload, same window
        PageStatus::Ok,    // four stalled samples follow
        PageStatus::Ok,
        PageStatus::Ok,
        PageStatus::Ok,
    ]);
    driver.push_statuses(&[PageStatus::Empty; 11]);

    let config = test_config("huge_account");
    run_deep_drill(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(driver.reloads, 1, "crash recovery reloads in place");
    assert_eq!(
        driver.navigations.len(),
        12,
        "recovery must not re-navigate or skip the window"
    );
}

#[tokio::test]
async fn test_deep_drill_crash_on_entry_recovers_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    driver.push_statuses(&[
        PageStatus::Crash, // window entry crashes
        PageStatus::Empty, // after reload the window turns out empty
    ]);
    driver.push_statuses(&[PageStatus::Empty; 11]);

    let config = test_config("huge_account");
    run_deep_drill(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(driver.reloads, 1);
    assert_eq!(driver.bottom_scrolls, 0);
}

#[tokio::test]
async fn test_deep_drill_abandons_window_after_crash_budget() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    // December crashes on every scroll; the crash budget must end the window
    driver.push_statuses(&[PageStatus::Ok]); // entry
    driver.push_statuses(&[PageStatus::Crash; 3]);
    driver.push_statuses(&[PageStatus::Empty; 11]);

    let mut config = test_config("huge_account");
    config.max_consecutive_crashes = 2;
    run_deep_drill(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(driver.reloads, 2, "two tolerated crashes, then abandonment");
    assert_eq!(driver.navigations.len(), 12, "remaining windows still run");
}

#[tokio::test]
async fn test_discovery_selects_fast_mode_from_probe() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx.clone());

    // The profile page triggers the stats response before any scrolling
    tx.send(probe_response(42)).unwrap();

    let config = test_config("small_account");
    let report = run_discovery(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(report.strategy, CrawlStrategy::FastScroll);
    assert!(driver
        .navigations
        .iter()
        .any(|u| u.ends_with("/small_account/media")));
}

#[tokio::test]
async fn test_discovery_selects_deep_mode_from_probe() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx.clone());
    driver.push_statuses(&[PageStatus::Empty; 12]);

    tx.send(probe_response(5000)).unwrap();

    let config = test_config("huge_account");
    let report = run_discovery(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(report.strategy, CrawlStrategy::DeepDrill);
    assert!(driver.navigations.iter().any(|u| u.contains("/search?q=")));
}

#[tokio::test]
async fn test_discovery_substitutes_estimate_when_probe_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);
    driver.push_statuses(&[PageStatus::Empty; 12]);

    // No probe response arrives at all
    let mut config = test_config("mystery_account");
    config.assume_large = true;
    let report = run_discovery(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(report.strategy, CrawlStrategy::DeepDrill);
}

#[tokio::test]
async fn test_dedup_holds_across_windows() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, tx) = session_in(dir.path());
    let mut driver = ScriptedDriver::new(tx);

    // The same asset shows up twice while December scrolls; every later
    // window is empty
    driver.push_batch(vec![media_response(&["https://pbs.test/media/dup.jpg"])]);
    driver.push_batch(vec![media_response(&["https://pbs.test/media/dup.jpg"])]);
    driver.push_statuses(&[PageStatus::Ok; 6]);
    driver.push_statuses(&[PageStatus::Empty; 11]);

    let config = test_config("huge_account");
    run_deep_drill(&mut driver, &mut session, &config)
        .await
        .unwrap();

    assert_eq!(session.candidate_count(), 1);
    let content = std::fs::read_to_string(dir.path().join("links.txt")).unwrap();
    assert_eq!(content.lines().count(), 1);
}
