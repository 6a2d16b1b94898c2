//! Browser collaborator abstraction
//!
//! The discovery stage never talks to a browser directly. It drives a
//! [`PageDriver`] and reads the network responses that driving produces from
//! an [`ApiResponse`] channel. This keeps the crawl state machines testable
//! against a scripted driver and confines all CDP plumbing to one module.

mod chromium;

pub use chromium::ChromiumDriver;

use crate::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One network response captured from the driven page
///
/// Delivery is at-least-once and in page order; the extraction engine
/// deduplicates, so replays are harmless.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Request URL the page issued
    pub url: String,
    /// HTTP status of the response
    pub status: u16,
    /// Raw response body
    pub body: String,
}

/// Immediate classification of the visible page state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Results are rendering normally
    Ok,
    /// The feed reports no results for the current query
    Empty,
    /// An error banner is showing; the page needs a cooldown and reload
    Crash,
}

/// Sender half of the response channel a driver feeds
pub type ResponseSender = mpsc::UnboundedSender<ApiResponse>;

/// Receiver half consumed by the crawl session
pub type ResponseReceiver = mpsc::UnboundedReceiver<ApiResponse>;

/// Creates the channel connecting a driver to a crawl session
pub fn response_channel() -> (ResponseSender, ResponseReceiver) {
    mpsc::unbounded_channel()
}

/// Page-navigation primitives the crawl strategies are written against
///
/// Implementations forward every interesting network response into the
/// [`ResponseSender`] they were constructed with; the trait itself only
/// covers navigation and visibility.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigates the page to the given URL and waits for the load to settle
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Reloads the current page
    async fn reload(&mut self) -> Result<()>;

    /// Scrolls to the bottom of the document to trigger further loading
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Scrolls vertically by the given delta (negative scrolls up)
    async fn scroll_by(&mut self, delta_y: i64) -> Result<()>;

    /// Classifies what the page currently shows
    async fn status(&mut self) -> Result<PageStatus>;

    /// Returns the URL the page is currently on
    async fn current_url(&mut self) -> Result<String>;
}
