//! Page fetching strategies.
//!
//! A [`PageFetcher`] turns a URL into HTML. The [`FetchChain`] tries its
//! strategies in order (headless rendering first, plain HTTP second) and only
//! fails when every one of them failed.

pub mod browser;
pub mod http;
pub mod selectors;

use crate::config::Config;
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use browser::{BrowserFetcher, RenderOptions};
pub use http::HttpFetcher;

/// Trait for fetching page HTML - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page and returns its HTML.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Fetches the page, letting a rendering strategy wait until
    /// `ready_selector` matches before capturing it.
    ///
    /// Strategies without a live DOM ignore the selector.
    async fn fetch_when_ready(&self, url: &str, ready_selector: Option<&str>) -> Result<String> {
        let _ = ready_selector;
        self.fetch(url).await
    }

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Ordered list of fetch strategies; the first success wins.
#[derive(Default)]
pub struct FetchChain {
    strategies: Vec<Box<dyn PageFetcher>>,
}

impl FetchChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a strategy to the chain.
    pub fn with(mut self, fetcher: impl PageFetcher + 'static) -> Self {
        self.strategies.push(Box::new(fetcher));
        self
    }

    /// Builds the chain the configuration asks for.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut chain = Self::new();

        if config.render {
            chain = chain.with(BrowserFetcher::new(RenderOptions::from(config)));
        }

        if config.http_fallback {
            chain = chain.with(HttpFetcher::new(config)?);
        }

        debug!("Fetch chain: [{}]", chain.names().join(", "));
        Ok(chain)
    }

    /// Names of the configured strategies, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns true if no strategy is configured.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[async_trait]
impl PageFetcher for FetchChain {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetch_when_ready(url, None).await
    }

    async fn fetch_when_ready(&self, url: &str, ready_selector: Option<&str>) -> Result<String> {
        if self.strategies.is_empty() {
            anyhow::bail!("no fetch strategy enabled");
        }

        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.fetch_when_ready(url, ready_selector).await {
                Ok(html) => {
                    info!("Fetched {} via {} ({} bytes)", url, strategy.name(), html.len());
                    return Ok(html);
                }
                Err(e) => {
                    warn!("{} fetch failed for {}: {:#}", strategy.name(), url, e);
                    failures.push(format!("{}: {:#}", strategy.name(), e));
                }
            }
        }

        anyhow::bail!(failures.join("; "))
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

/// Fetches a page, mapping any strategy failure to [`Error::Fetch`].
///
/// `ready_selector` is the element a renderer should wait for; `None` waits
/// for the generic price markers.
pub async fn fetch_rendered_html<F>(
    fetcher: &F,
    url: &str,
    ready_selector: Option<&str>,
) -> crate::Result<String>
where
    F: PageFetcher + ?Sized,
{
    fetcher
        .fetch_when_ready(url, ready_selector)
        .await
        .map_err(|e| Error::Fetch { url: url.to_string(), reason: format!("{:#}", e) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted fetcher for chain tests.
    struct StaticFetcher {
        name: &'static str,
        html: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticFetcher {
        fn ok(name: &'static str, html: &'static str) -> Self {
            Self { name, html: Some(html), calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn failing(name: &'static str) -> Self {
            Self { name, html: None, calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.html {
                Some(html) => Ok(html.to_string()),
                None => anyhow::bail!("{} unavailable", self.name),
            }
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let second = StaticFetcher::ok("http", "<p>http</p>");
        let second_calls = Arc::clone(&second.calls);
        let chain = FetchChain::new().with(StaticFetcher::ok("render", "<p>render</p>")).with(second);

        let html = chain.fetch("https://shop.test").await.unwrap();
        assert_eq!(html, "<p>render</p>");
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_on_failure() {
        let chain = FetchChain::new()
            .with(StaticFetcher::failing("render"))
            .with(StaticFetcher::ok("http", "<p>http</p>"));

        let html = chain.fetch("https://shop.test").await.unwrap();
        assert_eq!(html, "<p>http</p>");
    }

    #[tokio::test]
    async fn test_all_failures_reported() {
        let chain = FetchChain::new()
            .with(StaticFetcher::failing("render"))
            .with(StaticFetcher::failing("http"));

        let err = fetch_rendered_html(&chain, "https://shop.test", None).await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
        let msg = err.to_string();
        assert!(msg.contains("render unavailable"));
        assert!(msg.contains("http unavailable"));
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = FetchChain::new();
        assert!(chain.is_empty());
        let err = fetch_rendered_html(&chain, "https://shop.test", None).await.unwrap_err();
        assert!(err.to_string().contains("no fetch strategy enabled"));
    }

    /// Records the ready selector each call was given.
    #[derive(Default)]
    struct RecordingFetcher {
        seen: Arc<std::sync::Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.fetch_when_ready(url, None).await
        }

        async fn fetch_when_ready(&self, _url: &str, ready_selector: Option<&str>) -> Result<String> {
            self.seen.lock().unwrap().push(ready_selector.map(str::to_string));
            Ok("<p>ok</p>".to_string())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_chain_forwards_ready_selector() {
        let recorder = RecordingFetcher::default();
        let seen = Arc::clone(&recorder.seen);
        let chain = FetchChain::new().with(StaticFetcher::failing("render")).with(recorder);

        fetch_rendered_html(&chain, "https://shop.test", Some("span.prc-dsc")).await.unwrap();
        chain.fetch("https://shop.test").await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some("span.prc-dsc".to_string()), None]);
    }

    #[tokio::test]
    async fn test_default_fetch_when_ready_ignores_selector() {
        let fetcher = StaticFetcher::ok("http", "<p>http</p>");
        let html = fetcher.fetch_when_ready("https://shop.test", Some("#price")).await.unwrap();
        assert_eq!(html, "<p>http</p>");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_from_config_respects_flags() {
        let config = Config { render: false, ..Config::default() };
        let chain = FetchChain::from_config(&config).unwrap();
        assert_eq!(chain.names(), vec!["http"]);

        let config = Config { render: true, http_fallback: false, ..Config::default() };
        let chain = FetchChain::from_config(&config).unwrap();
        assert_eq!(chain.names(), vec!["browser"]);

        let config = Config { render: false, http_fallback: false, ..Config::default() };
        assert!(FetchChain::from_config(&config).unwrap().is_empty());
    }
}
