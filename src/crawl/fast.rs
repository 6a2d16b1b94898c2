//! Fast scroll crawl strategy
//!
//! Used for accounts below the strategy threshold: scroll the media
//! timeline to the bottom, let the page settle, and sample how many
//! candidates the captured responses produced. Stall detection decides
//! when to jiggle the page and when the timeline is exhausted.

use crate::browser::PageDriver;
use crate::config::DiscoveryConfig;
use crate::crawl::session::CrawlSession;
use crate::crawl::stall::{StallAction, StallTracker};
use crate::crawl::{corrective_jiggle, settle};
use crate::Result;

/// Scroll distance of the corrective jiggle.
const JIGGLE_LIFT: i64 = -500;

/// Crawls the full timeline until the candidate count stops growing
///
/// The stall thresholds come from the configuration (defaults: jiggle after
/// 3 unchanged samples, finish after 5). The iteration bound guards against
/// a feed that keeps shuffling content without ever stabilizing.
pub async fn run_fast_scroll<D: PageDriver>(
    driver: &mut D,
    session: &mut CrawlSession,
    config: &DiscoveryConfig,
) -> Result<()> {
    let mut tracker = StallTracker::new(
        config.fast_jiggle_strikes,
        config.fast_finish_strikes,
        session.candidate_count(),
    );

    for _ in 0..config.max_iterations {
        driver.scroll_to_bottom().await?;
        settle(config.settle_delay_secs).await;
        session.drain_responses()?;

        let count = session.candidate_count();
        tracing::info!("Items found: {}", count);

        match tracker.observe(count) {
            StallAction::Continue => {}
            StallAction::Jiggle => corrective_jiggle(driver, JIGGLE_LIFT).await?,
            StallAction::Finish => {
                tracing::info!("Reached bottom after {} items", count);
                return Ok(());
            }
        }
    }

    tracing::warn!(
        "Fast scroll hit the {}-iteration bound before stalling out",
        config.max_iterations
    );
    Ok(())
}
