//! Stall detection shared by both crawl strategies
//!
//! A crawl step is "stalled" when a scroll-and-settle cycle produces no new
//! candidates. Consecutive stalls first earn a corrective jiggle, then end
//! the crawl (or the current window).

/// What the crawler should do after the latest sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallAction {
    /// Keep scrolling
    Continue,
    /// Issue one corrective scroll-up-then-down to kick lazy loading
    Jiggle,
    /// Stop; the feed has stopped producing
    Finish,
}

/// Counts consecutive no-growth samples of the candidate set
///
/// The strike counter resets on any growth. The jiggle fires exactly once,
/// when the strike count first reaches the jiggle threshold; it does not
/// reset the counter.
#[derive(Debug)]
pub struct StallTracker {
    strikes: u32,
    last_count: usize,
    jiggle_at: u32,
    finish_at: u32,
}

impl StallTracker {
    /// Creates a tracker seeded with the candidate count at loop entry
    pub fn new(jiggle_at: u32, finish_at: u32, initial_count: usize) -> Self {
        Self {
            strikes: 0,
            last_count: initial_count,
            jiggle_at,
            finish_at,
        }
    }

    /// Feeds one post-settle sample of the candidate count
    pub fn observe(&mut self, count: usize) -> StallAction {
        if count != self.last_count {
            self.strikes = 0;
            self.last_count = count;
            return StallAction::Continue;
        }

        self.strikes += 1;
        if self.strikes >= self.finish_at {
            StallAction::Finish
        } else if self.strikes == self.jiggle_at {
            StallAction::Jiggle
        } else {
            StallAction::Continue
        }
    }

    /// Current consecutive-stall count
    pub fn strikes(&self) -> u32 {
        self.strikes
    }
}
