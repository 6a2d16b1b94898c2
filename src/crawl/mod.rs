//! Discovery stage: adaptive feed crawling
//!
//! This module contains the crawl strategies and their shared machinery:
//! - media extraction from captured responses
//! - stall detection driving corrective action and termination
//! - the fast full-timeline scroll for small accounts
//! - the month-partitioned deep drill for large accounts
//! - strategy selection from the probed or estimated item count

mod deep;
mod extract;
mod fast;
mod session;
mod stall;

pub use deep::{month_windows, run_deep_drill, search_url, CrawlWindow};
pub use extract::{extract_media, probe_media_count};
pub use fast::run_fast_scroll;
pub use session::{CrawlSession, MediaKind};
pub use stall::{StallAction, StallTracker};

use crate::browser::PageDriver;
use crate::config::DiscoveryConfig;
use crate::Result;
use rand::Rng;
use std::time::Duration;

/// Feed origin all crawl navigation is rooted at.
pub(crate) const BASE_URL: &str = "https://x.com";

/// Count substituted when probing failed and the account is assumed large.
const LARGE_ESTIMATE: u64 = 9999;

/// Count substituted when probing failed and the account is assumed small.
const SMALL_ESTIMATE: u64 = 100;

/// A single discovered media reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    /// Canonical, deduplication-key form of the link
    pub url: String,
    pub kind: MediaKind,
}

/// Crawl strategy chosen for a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStrategy {
    /// Scroll the media timeline to the bottom; for small accounts
    FastScroll,
    /// Month-by-month date-bounded search; for accounts past the threshold
    DeepDrill,
}

/// Outcome summary of a discovery run
#[derive(Debug)]
pub struct DiscoveryReport {
    pub strategy: CrawlStrategy,
    pub discovered: usize,
}

/// Chooses the crawl strategy from the probed item count
///
/// A failed probe is not an error: the operator-provided `assume_large`
/// estimate is substituted and the same threshold rule applied.
pub fn select_strategy(
    probed: Option<u64>,
    assume_large: bool,
    threshold: u64,
) -> CrawlStrategy {
    let effective = probed.unwrap_or(if assume_large {
        LARGE_ESTIMATE
    } else {
        SMALL_ESTIMATE
    });

    if effective < threshold {
        CrawlStrategy::FastScroll
    } else {
        CrawlStrategy::DeepDrill
    }
}

/// Runs a complete discovery pass against an already-launched driver
///
/// 1. Visit the profile so the page triggers its stats request (the probe)
/// 2. Wait out a manual login if the feed bounced us to one
/// 3. Select the strategy from the probed count
/// 4. Run the chosen crawler; every discovered link has already been
///    streamed into the session's sink by the time this returns
pub async fn run_discovery<D: PageDriver>(
    driver: &mut D,
    session: &mut CrawlSession,
    config: &DiscoveryConfig,
) -> Result<DiscoveryReport> {
    let profile_url = format!("{}/{}", BASE_URL, config.handle);

    tracing::info!("Checking profile stats for @{}", config.handle);
    driver.navigate(&profile_url).await?;
    settle(config.settle_delay_secs).await;
    session.drain_responses()?;

    if driver.current_url().await?.contains("login") {
        wait_for_login(driver, config).await?;
        driver.navigate(&profile_url).await?;
        settle(config.settle_delay_secs).await;
        session.drain_responses()?;
    }

    let probed = session.probed_media_count();
    if probed.is_none() {
        tracing::warn!(
            "Could not auto-detect media count; assuming {} account",
            if config.assume_large { "large" } else { "small" }
        );
    }

    let strategy = select_strategy(probed, config.assume_large, config.threshold_count);
    match strategy {
        CrawlStrategy::FastScroll => {
            tracing::info!("Activating fast scroll mode");
            driver
                .navigate(&format!("{}/{}/media", BASE_URL, config.handle))
                .await?;
            settle(config.settle_delay_secs).await;
            run_fast_scroll(driver, session, config).await?;
        }
        CrawlStrategy::DeepDrill => {
            tracing::info!("Activating deep drill mode (month-by-month)");
            run_deep_drill(driver, session, config).await?;
        }
    }

    Ok(DiscoveryReport {
        strategy,
        discovered: session.candidate_count(),
    })
}

/// Blocks until the operator finishes logging in, or the wait budget runs out
async fn wait_for_login<D: PageDriver>(driver: &mut D, config: &DiscoveryConfig) -> Result<()> {
    tracing::warn!("Feed redirected to login; complete the login in the browser window");

    let deadline = std::time::Instant::now() + Duration::from_secs(config.login_wait_secs);
    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;
        if !driver.current_url().await?.contains("login") {
            tracing::info!("Login detected, resuming");
            return Ok(());
        }
        if std::time::Instant::now() > deadline {
            return Err(crate::MagpieError::Browser(format!(
                "no login after {}s",
                config.login_wait_secs
            )));
        }
    }
}

/// Issues the corrective scroll-up-then-down that kicks lazy loading
pub(crate) async fn corrective_jiggle<D: PageDriver>(driver: &mut D, lift: i64) -> Result<()> {
    tracing::info!("Jiggling page to trigger lazy loading");
    driver.scroll_by(lift).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    driver.scroll_to_bottom().await?;
    Ok(())
}

/// Sleeps for a fixed number of (possibly fractional) seconds
pub(crate) async fn settle(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

/// Sleeps for a uniformly jittered interval from the configured range
pub(crate) async fn jittered_settle(config: &DiscoveryConfig) {
    let secs = {
        let mut rng = rand::thread_rng();
        rng.gen_range(config.jitter_min_secs..=config.jitter_max_secs)
    };
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
