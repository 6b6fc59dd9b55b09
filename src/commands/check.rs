//! Price check command implementation.

use crate::config::Config;
use crate::extract::{check_price, PriceSource};
use crate::fetch::{FetchChain, PageFetcher};
use crate::format::Formatter;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// Result of one price check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub url: String,
    pub price: f64,
    pub source: PriceSource,
    pub selector: Option<String>,
    pub target_price: Option<f64>,
    /// `price <= target_price`, when a target was given.
    pub target_reached: Option<bool>,
}

/// Extracts the current price of a product page.
pub struct CheckCommand {
    config: Config,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Checks the live page and returns formatted output.
    pub async fn execute(&self, url: &str, selector: Option<&str>, target: Option<f64>) -> Result<String> {
        let chain = FetchChain::from_config(&self.config).context("Failed to set up page fetching")?;

        self.execute_with_fetcher(&chain, url, selector, target).await
    }

    /// Checks with a provided fetcher (for testing).
    pub async fn execute_with_fetcher(
        &self,
        fetcher: &impl PageFetcher,
        url: &str,
        selector: Option<&str>,
        target: Option<f64>,
    ) -> Result<String> {
        let report = self.report(fetcher, url, selector, target).await?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_check(&report))
    }

    /// Runs the check and returns the unformatted report.
    pub async fn report(
        &self,
        fetcher: &impl PageFetcher,
        url: &str,
        selector: Option<&str>,
        target: Option<f64>,
    ) -> Result<CheckReport> {
        let extraction = check_price(fetcher, url, selector).await?;
        let target_reached = target.map(|t| extraction.price <= t);

        if target_reached == Some(true) {
            info!("Target reached for {}: {} <= {:?}", url, extraction.price, target);
        }

        Ok(CheckReport {
            url: url.trim().to_string(),
            price: extraction.price,
            source: extraction.source,
            selector: selector.map(str::to_string),
            target_price: target,
            target_reached,
        })
    }
}
