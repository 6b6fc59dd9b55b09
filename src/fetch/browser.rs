//! Headless Chromium fetcher using chromiumoxide.
//!
//! Every call launches its own browser, so sessions never share cookies or
//! state, and the browser is torn down before the call returns.

use super::selectors::{self, PopupTarget, POPUP_TARGETS};
use super::PageFetcher;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Poll interval while waiting for price markup to appear.
const READY_POLL: Duration = Duration::from_millis(250);

/// Timing and launch settings for a rendering session.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
    pub popup_timeout: Duration,
    pub scroll_settle: Duration,
    pub selector_wait: Duration,
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            navigation_timeout: config.navigation_timeout(),
            popup_timeout: config.popup_timeout(),
            scroll_settle: config.scroll_settle(),
            selector_wait: config.selector_wait(),
        }
    }
}

/// Rendering strategy: navigate, dismiss popups, scroll, wait, serialize.
pub struct BrowserFetcher {
    options: RenderOptions,
}

impl BrowserFetcher {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetch_when_ready(url, None).await
    }

    async fn fetch_when_ready(&self, url: &str, ready_selector: Option<&str>) -> Result<String> {
        let ready = selectors::ready_selector(ready_selector);
        let mut session = BrowserSession::launch(&self.options).await?;
        let result = session.render(url, &self.options, &ready).await;
        session.close().await;
        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

/// One launched browser plus the task pumping its CDP events.
///
/// Dropping the session kills the browser process, which covers panics and
/// cancelled futures; [`BrowserSession::close`] is the graceful path.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(options: &RenderOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--mute-audio")
            .window_size(1920, 1080)
            .request_timeout(options.navigation_timeout);

        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) =
            Browser::launch(config).await.context("Failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    trace!("CDP handler error");
                }
            }
        });

        debug!("Chromium session started");
        Ok(Self { browser, handler })
    }

    async fn render(&self, url: &str, options: &RenderOptions, ready: &str) -> Result<String> {
        let page = self.browser.new_page("about:blank").await.context("Failed to open page")?;

        match tokio::time::timeout(options.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => debug!("Navigated to {}", url),
            Ok(Err(e)) => anyhow::bail!("Navigation failed: {}", e),
            Err(_) => anyhow::bail!(
                "Navigation timed out after {}ms",
                options.navigation_timeout.as_millis()
            ),
        }

        dismiss_popups(&page, options.popup_timeout).await;
        scroll_to_bottom(&page, options.scroll_settle).await;
        wait_for_markup(&page, ready, options.selector_wait).await;

        page.content().await.context("Failed to read page content")
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser wait failed: {}", e);
        }
        self.handler.abort();
        debug!("Chromium session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Tries every popup target once; each attempt is bounded and failures are ignored.
async fn dismiss_popups(page: &Page, per_attempt: Duration) {
    for target in POPUP_TARGETS {
        if click(page, target, per_attempt).await {
            debug!("Dismissed overlay via {}", target.describe());
        }
    }
}

async fn click(page: &Page, target: &PopupTarget, budget: Duration) -> bool {
    match tokio::time::timeout(budget, page.evaluate(target.click_script())).await {
        Ok(Ok(result)) => result.into_value::<bool>().unwrap_or(false),
        Ok(Err(e)) => {
            trace!("Popup attempt {} failed: {}", target.describe(), e);
            false
        }
        Err(_) => {
            trace!("Popup attempt {} timed out", target.describe());
            false
        }
    }
}

/// Scrolls to the bottom and pauses so lazy sections can attach.
async fn scroll_to_bottom(page: &Page, settle: Duration) {
    if let Err(e) = page.evaluate(selectors::SCROLL_TO_BOTTOM).await {
        warn!("Scroll failed: {}", e);
    }
    tokio::time::sleep(settle).await;
}

/// Waits until `ready` matches an element, or the budget runs out.
async fn wait_for_markup(page: &Page, ready: &str, budget: Duration) {
    let found = tokio::time::timeout(budget, async {
        loop {
            if page.find_element(ready).await.is_ok() {
                return;
            }
            tokio::time::sleep(READY_POLL).await;
        }
    })
    .await;

    match found {
        Ok(()) => debug!("'{}' present", ready),
        Err(_) => debug!("'{}' absent after {}ms", ready, budget.as_millis()),
    }
}
