//! Chromium-backed page driver using chromiumoxide
//!
//! Launches a headful Chromium with a persistent profile directory so a
//! manual login survives across runs, and forwards timeline API responses
//! into the session's response channel.

use crate::browser::{ApiResponse, PageDriver, PageStatus, ResponseSender};
use crate::config::DiscoveryConfig;
use crate::{MagpieError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::cdp::browser_protocol::page::ReloadParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// Substrings of request URLs worth capturing; everything else is ignored
/// before any body transfer happens.
const CAPTURED_ENDPOINTS: [&str; 3] = ["UserMedia", "SearchTimeline", "UserByScreenName"];

/// Text markers used to classify the visible page state.
const EMPTY_MARKER: &str = "No results for";
const CRASH_MARKERS: [&str; 2] = ["Something went wrong", "Try again"];

/// Driver over a real Chromium page
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    listener_task: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launches Chromium and wires network capture into `responses`
    ///
    /// The browser runs headful: the discovery stage targets a logged-in
    /// feed, and the login itself is performed by the operator in the
    /// opened window.
    pub async fn launch(config: &DiscoveryConfig, responses: ResponseSender) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(&config.user_data_dir)
            .window_size(1280, 720)
            .arg("--disable-blink-features=AutomationControlled")
            .build()
            .map_err(MagpieError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;

        // The handler stream must be driven for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;

        let listener_task = spawn_response_listener(&page, responses).await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            listener_task,
        })
    }

    /// Closes the browser and stops the background tasks
    pub async fn close(mut self) -> Result<()> {
        self.listener_task.abort();
        self.browser
            .close()
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;
        self.handler_task.abort();
        Ok(())
    }
}

/// Subscribes to network responses on the page and forwards captured bodies
async fn spawn_response_listener(
    page: &Page,
    responses: ResponseSender,
) -> Result<JoinHandle<()>> {
    let mut events = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| MagpieError::Browser(e.to_string()))?;
    let body_page = page.clone();

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let url = event.response.url.clone();
            if !CAPTURED_ENDPOINTS.iter().any(|m| url.contains(m)) {
                continue;
            }

            // Bodies are fetched lazily and only for captured endpoints. A
            // body can be gone by the time we ask (page navigated away);
            // that response is simply dropped.
            let params = GetResponseBodyParams::new(event.request_id.clone());
            match body_page.execute(params).await {
                Ok(result) => {
                    let body = &result.result;
                    if body.base64_encoded {
                        tracing::debug!("Skipping base64-encoded body for {}", url);
                        continue;
                    }
                    let response = ApiResponse {
                        url,
                        status: event.response.status as u16,
                        body: body.body.clone(),
                    };
                    if responses.send(response).is_err() {
                        // Session hung up; stop listening
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("Response body unavailable for {}: {}", url, e);
                }
            }
        }
    }))
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        self.page
            .execute(ReloadParams::default())
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn scroll_by(&mut self, delta_y: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", delta_y))
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn status(&mut self) -> Result<PageStatus> {
        let text: String = self
            .page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?
            .into_value()
            .map_err(|e| MagpieError::Browser(format!("status evaluation: {:?}", e)))?;

        if text.contains(EMPTY_MARKER) {
            return Ok(PageStatus::Empty);
        }
        if CRASH_MARKERS.iter().any(|m| text.contains(m)) {
            return Ok(PageStatus::Crash);
        }
        Ok(PageStatus::Ok)
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| MagpieError::Browser(e.to_string()))?;
        Ok(url.map(|u| u.to_string()).unwrap_or_default())
    }
}
