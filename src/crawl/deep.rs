//! Deep drill crawl strategy
//!
//! The feed caps how far back a plain timeline scroll can paginate, so
//! large accounts are crawled month by month through date-bounded searches,
//! newest windows first. Each window runs the same stall detection as the
//! fast scroll with tighter thresholds, plus crash recovery: an error
//! banner triggers a cooldown and reload that resumes the same window.

use crate::browser::{PageDriver, PageStatus};
use crate::config::DiscoveryConfig;
use crate::crawl::session::CrawlSession;
use crate::crawl::stall::{StallAction, StallTracker};
use crate::crawl::{corrective_jiggle, jittered_settle, BASE_URL};
use crate::Result;
use chrono::NaiveDate;
use std::time::Duration;

/// Scroll distance of the corrective jiggle inside a window.
const JIGGLE_LIFT: i64 = -400;

/// One month-sized slice of the account's history
///
/// Derived, ephemeral, consumed by exactly one crawl pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlWindow {
    pub year: i32,
    pub month: u32,
    /// First day of the month
    pub since: NaiveDate,
    /// Last day of the month
    pub until: NaiveDate,
}

/// Builds the windows covering `[start_year, end_year]`, newest first
///
/// Years iterate descending and months 12 down to 1 within each year, so
/// the most recent content is harvested before the feed gets a chance to
/// throttle the session.
pub fn month_windows(start_year: i32, end_year: i32) -> Vec<CrawlWindow> {
    let mut windows = Vec::new();
    for year in (start_year..=end_year).rev() {
        for month in (1..=12u32).rev() {
            // Both bounds are valid by construction for 2000..=2100
            let since = NaiveDate::from_ymd_opt(year, month, 1)
                .expect("first of month is always valid");
            let until = last_day_of_month(year, month);
            windows.push(CrawlWindow {
                year,
                month,
                since,
                until,
            });
        }
    }
    windows
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("first of month is always valid")
        .pred_opt()
        .expect("dates in range have a predecessor")
}

/// Builds the date-bounded live-search URL for one window
///
/// The query is percent-encoded the way the feed's own search box does it:
/// spaces and colons only.
pub fn search_url(handle: &str, window: &CrawlWindow) -> String {
    let query = format!(
        "from:{} filter:media since:{} until:{}",
        handle,
        window.since.format("%Y-%m-%d"),
        window.until.format("%Y-%m-%d")
    );
    let encoded = query.replace(' ', "%20").replace(':', "%3A");
    format!("{}/search?q={}&src=typed_query&f=live", BASE_URL, encoded)
}

/// Crawls every month window across the configured year range
pub async fn run_deep_drill<D: PageDriver>(
    driver: &mut D,
    session: &mut CrawlSession,
    config: &DiscoveryConfig,
) -> Result<()> {
    for window in month_windows(config.start_year, config.end_year) {
        drill_window(driver, session, config, &window).await?;
    }
    Ok(())
}

/// Crawls one month window to exhaustion
async fn drill_window<D: PageDriver>(
    driver: &mut D,
    session: &mut CrawlSession,
    config: &DiscoveryConfig,
    window: &CrawlWindow,
) -> Result<()> {
    tracing::info!("Drilling {}-{:02}", window.year, window.month);

    driver.navigate(&search_url(&config.handle, window)).await?;
    jittered_settle(config).await;
    session.drain_responses()?;

    match driver.status().await? {
        PageStatus::Empty => {
            tracing::info!("Empty month, skipping");
            return Ok(());
        }
        PageStatus::Crash => {
            tracing::warn!(
                "Crash detected on window entry, cooling down {}s",
                config.cooldown_secs
            );
            cooldown_and_reload(driver, config).await?;
            session.drain_responses()?;
            if driver.status().await? == PageStatus::Empty {
                tracing::info!("Empty month after reload, skipping");
                return Ok(());
            }
        }
        PageStatus::Ok => {}
    }

    let mut tracker = StallTracker::new(
        config.deep_jiggle_strikes,
        config.deep_finish_strikes,
        session.candidate_count(),
    );
    let mut consecutive_crashes = 0u32;

    for _ in 0..config.max_iterations {
        driver.scroll_to_bottom().await?;
        jittered_settle(config).await;
        session.drain_responses()?;

        match driver.status().await? {
            PageStatus::Crash => {
                consecutive_crashes += 1;
                if consecutive_crashes > config.max_consecutive_crashes {
                    tracing::warn!(
                        "Abandoning {}-{:02} after {} consecutive crashes",
                        window.year,
                        window.month,
                        consecutive_crashes - 1
                    );
                    return Ok(());
                }
                tracing::warn!(
                    "Crash during scroll ({}/{}), reloading",
                    consecutive_crashes,
                    config.max_consecutive_crashes
                );
                cooldown_and_reload(driver, config).await?;
                // Same window continues; nothing already sunk is lost
                continue;
            }
            PageStatus::Empty => {
                tracing::info!("Feed ran dry mid-window");
                return Ok(());
            }
            PageStatus::Ok => {
                consecutive_crashes = 0;
            }
        }

        let count = session.candidate_count();
        match tracker.observe(count) {
            StallAction::Continue => {
                tracing::info!("Found: {} (total)", count);
            }
            StallAction::Jiggle => corrective_jiggle(driver, JIGGLE_LIFT).await?,
            StallAction::Finish => {
                tracing::info!("Finished {}-{:02}", window.year, window.month);
                return Ok(());
            }
        }
    }

    tracing::warn!(
        "Window {}-{:02} hit the {}-iteration bound",
        window.year,
        window.month,
        config.max_iterations
    );
    Ok(())
}

/// Waits out the cooldown, reloads, and gives the page time to re-render
async fn cooldown_and_reload<D: PageDriver>(
    driver: &mut D,
    config: &DiscoveryConfig,
) -> Result<()> {
    tokio::time::sleep(Duration::from_secs(config.cooldown_secs)).await;
    driver.reload().await?;
    tokio::time::sleep(Duration::from_secs(config.reload_settle_secs)).await;
    Ok(())
}
