//! Crawl session state
//!
//! All mutable discovery state lives in one explicit [`CrawlSession`] value
//! that is passed into each crawl step. The candidate set is write-once:
//! URLs are inserted and never removed, and discovery order is materialized
//! by the link sink's append order.

use crate::browser::{ApiResponse, ResponseReceiver};
use crate::crawl::extract;
use crate::output::LinkSink;
use crate::Result;
use std::collections::HashSet;

/// Kind of a discovered media candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Mutable state of one discovery run
pub struct CrawlSession {
    /// Canonical URLs seen so far; membership is never revoked
    seen: HashSet<String>,

    /// Media count reported by the profile-stats response, when captured
    probed_media_count: Option<u64>,

    /// Durable sink receiving each new canonical URL as it is admitted
    sink: LinkSink,

    /// Channel of captured network responses from the page driver
    responses: ResponseReceiver,
}

impl CrawlSession {
    /// Creates a session writing discoveries into `sink` and reading
    /// captured responses from `responses`
    pub fn new(sink: LinkSink, responses: ResponseReceiver) -> Self {
        Self {
            seen: HashSet::new(),
            probed_media_count: None,
            sink,
            responses,
        }
    }

    /// Number of distinct candidates discovered so far
    pub fn candidate_count(&self) -> usize {
        self.seen.len()
    }

    /// Media count probed from the profile response, if any arrived
    pub fn probed_media_count(&self) -> Option<u64> {
        self.probed_media_count
    }

    /// Admits a canonical URL into the session
    ///
    /// Returns true when the URL was new; a new URL is appended to the link
    /// sink before this returns, so a crash can only lose the in-flight item.
    pub fn admit(&mut self, url: &str, kind: MediaKind) -> Result<bool> {
        if self.seen.contains(url) {
            return Ok(false);
        }
        self.sink.append(url)?;
        self.seen.insert(url.to_string());
        tracing::info!("Discovered {}: {}", kind, url);
        Ok(true)
    }

    /// Records the probed media count from the profile-stats response
    pub fn record_probe(&mut self, count: u64) {
        tracing::info!("Detected media count: {}", count);
        self.probed_media_count = Some(count);
    }

    /// Drains every captured response currently queued and feeds it through
    /// the extraction engine
    ///
    /// Called between crawl steps; the discovery stage is single-threaded
    /// cooperative, so nothing races this drain.
    pub fn drain_responses(&mut self) -> Result<()> {
        while let Ok(response) = self.responses.try_recv() {
            self.ingest(response)?;
        }
        Ok(())
    }

    /// Routes one captured response into the probe or the extractor
    fn ingest(&mut self, response: ApiResponse) -> Result<()> {
        if response.status != 200 {
            return Ok(());
        }

        let tree: serde_json::Value = match serde_json::from_str(&response.body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("Unparseable body from {}: {}", response.url, e);
                return Ok(());
            }
        };

        if response.url.contains("UserByScreenName") {
            if let Some(count) = extract::probe_media_count(&tree) {
                self.record_probe(count);
            }
            return Ok(());
        }

        if response.url.contains("UserMedia") || response.url.contains("SearchTimeline") {
            extract::extract_media(self, &tree)?;
        }

        Ok(())
    }
}
