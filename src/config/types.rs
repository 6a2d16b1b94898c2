use serde::Deserialize;

/// Main configuration structure for Magpie
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub acquisition: AcquisitionConfig,
}

/// Discovery-stage (browser crawl) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Account handle to crawl, without the leading "@"
    pub handle: String,

    /// Item count at or above which the deep-drill strategy is selected
    #[serde(rename = "threshold-count", default = "default_threshold_count")]
    pub threshold_count: u64,

    /// Fallback estimate when the media count cannot be probed:
    /// true maps to a large count, false to a small one
    #[serde(rename = "assume-large", default)]
    pub assume_large: bool,

    /// Seconds to let the page settle after each scroll
    #[serde(rename = "settle-delay-secs", default = "default_settle_delay")]
    pub settle_delay_secs: f64,

    /// Consecutive no-growth samples before the fast crawl jiggles the page
    #[serde(rename = "fast-jiggle-strikes", default = "default_fast_jiggle")]
    pub fast_jiggle_strikes: u32,

    /// Consecutive no-growth samples before the fast crawl finishes
    #[serde(rename = "fast-finish-strikes", default = "default_fast_finish")]
    pub fast_finish_strikes: u32,

    /// Consecutive no-growth samples before a deep-drill window jiggles
    #[serde(rename = "deep-jiggle-strikes", default = "default_deep_jiggle")]
    pub deep_jiggle_strikes: u32,

    /// Consecutive no-growth samples before a deep-drill window completes
    #[serde(rename = "deep-finish-strikes", default = "default_deep_finish")]
    pub deep_finish_strikes: u32,

    /// Hard upper bound on scroll iterations per crawl loop
    #[serde(rename = "max-iterations", default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Cooldown after an error banner before reloading, in seconds
    #[serde(rename = "cooldown-secs", default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Settle time after a reload, in seconds
    #[serde(rename = "reload-settle-secs", default = "default_reload_settle")]
    pub reload_settle_secs: u64,

    /// Consecutive crash/reload cycles tolerated within one window
    #[serde(
        rename = "max-consecutive-crashes",
        default = "default_max_consecutive_crashes"
    )]
    pub max_consecutive_crashes: u32,

    /// Lower bound of the random inter-action delay, in seconds
    #[serde(rename = "jitter-min-secs", default = "default_jitter_min")]
    pub jitter_min_secs: f64,

    /// Upper bound of the random inter-action delay, in seconds
    #[serde(rename = "jitter-max-secs", default = "default_jitter_max")]
    pub jitter_max_secs: f64,

    /// Oldest year covered by the deep drill
    #[serde(rename = "start-year", default = "default_start_year")]
    pub start_year: i32,

    /// Newest year covered by the deep drill
    #[serde(rename = "end-year", default = "default_end_year")]
    pub end_year: i32,

    /// Explicit path for the discovered-links file; derived from the
    /// handle when absent
    #[serde(rename = "links-path", default)]
    pub links_path: Option<String>,

    /// Browser profile directory, kept across runs so logins persist
    #[serde(rename = "user-data-dir", default = "default_user_data_dir")]
    pub user_data_dir: String,

    /// Seconds to wait for a manual login before giving up
    #[serde(rename = "login-wait-secs", default = "default_login_wait")]
    pub login_wait_secs: u64,
}

/// Acquisition-stage (download) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
    /// Explicit link file to download from; the newest `*links*.txt` in the
    /// working directory is used when absent
    #[serde(rename = "links-path", default)]
    pub links_path: Option<String>,

    /// Directory downloads are written to; derived from the link file name
    /// when absent
    #[serde(rename = "output-dir", default)]
    pub output_dir: Option<String>,

    /// Number of concurrent download workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per task before recording a permanent failure
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Connect timeout, in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle read timeout, in seconds
    #[serde(rename = "read-timeout-secs", default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Fixed sleep between attempts after a retryable status, in seconds
    #[serde(rename = "backoff-secs", default = "default_backoff")]
    pub backoff_secs: u64,

    /// Path of the append-only permanent-failure log
    #[serde(rename = "failure-log", default = "default_failure_log")]
    pub failure_log: String,

    /// User agent sent with download requests
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_threshold_count() -> u64 {
    800
}

fn default_settle_delay() -> f64 {
    4.0
}

fn default_fast_jiggle() -> u32 {
    3
}

fn default_fast_finish() -> u32 {
    5
}

fn default_deep_jiggle() -> u32 {
    2
}

fn default_deep_finish() -> u32 {
    4
}

fn default_max_iterations() -> u32 {
    500
}

fn default_cooldown() -> u64 {
    60
}

fn default_reload_settle() -> u64 {
    10
}

fn default_max_consecutive_crashes() -> u32 {
    5
}

fn default_jitter_min() -> f64 {
    3.0
}

fn default_jitter_max() -> f64 {
    5.0
}

fn default_start_year() -> i32 {
    2020
}

fn default_end_year() -> i32 {
    2025
}

fn default_user_data_dir() -> String {
    "./browser_profile".to_string()
}

fn default_login_wait() -> u64 {
    300
}

fn default_concurrency() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_read_timeout() -> u64 {
    30
}

fn default_backoff() -> u64 {
    1
}

fn default_failure_log() -> String {
    "failed_downloads.txt".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}
