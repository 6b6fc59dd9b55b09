//! Calibration command implementation.

use crate::calibrate::calibrate_with_candidates;
use crate::config::Config;
use crate::fetch::{FetchChain, PageFetcher};
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::info;

/// Pins an observed price on a product page to a selector.
pub struct CalibrateCommand {
    config: Config,
}

impl CalibrateCommand {
    /// Creates a new calibrate command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Calibrates against the live page and returns formatted output.
    pub async fn execute(&self, url: &str, observed: &str, target: f64, list: bool) -> Result<String> {
        let chain = FetchChain::from_config(&self.config).context("Failed to set up page fetching")?;

        self.execute_with_fetcher(&chain, url, observed, target, list).await
    }

    /// Calibrates with a provided fetcher (for testing).
    pub async fn execute_with_fetcher(
        &self,
        fetcher: &impl PageFetcher,
        url: &str,
        observed: &str,
        target: f64,
        list: bool,
    ) -> Result<String> {
        let report = calibrate_with_candidates(fetcher, url, observed, target).await?;

        info!(
            "Calibrated {} -> {} ({} candidate(s))",
            report.result.url,
            report.result.selector,
            report.candidates.len()
        );

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_calibration(&report, list))
    }
}
