//! Calibration: from a human-observed price string to a replayable selector.

use crate::error::{Error, Result};
use crate::extract::price_at_selector;
use crate::fetch::{fetch_rendered_html, PageFetcher};
use crate::locate::find_candidates;
use crate::price::{parse_price, same_price};
use crate::selector::synthesize;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of one calibration, handed to the caller for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub url: String,
    pub selector: String,
    pub initial_price: f64,
    pub target_price: f64,
}

/// One matching element, as offered for manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub selector: String,
    pub score: i32,
    pub tag: String,
    pub text: String,
}

/// Calibration plus every ranked candidate it was chosen from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub result: CalibrationResult,
    pub candidates: Vec<RankedCandidate>,
}

/// Validates the inputs and parses the observed price.
pub fn parse_observed(url: &str, observed: &str, target_price: f64) -> Result<f64> {
    if url.trim().is_empty() {
        return Err(Error::InvalidInput("url is empty".to_string()));
    }

    let observed = observed.trim();
    if observed.is_empty() {
        return Err(Error::InvalidInput("observed price text is empty".to_string()));
    }

    if !target_price.is_finite() {
        return Err(Error::InvalidInput(format!("target price {} is not a number", target_price)));
    }

    parse_price(observed).ok_or_else(|| Error::Parse(observed.to_string()))
}

/// Fetches the page and pins the observed price to a selector.
pub async fn calibrate<F>(
    fetcher: &F,
    url: &str,
    observed: &str,
    target_price: f64,
) -> Result<CalibrationResult>
where
    F: PageFetcher + ?Sized,
{
    Ok(calibrate_with_candidates(fetcher, url, observed, target_price).await?.result)
}

/// Like [`calibrate`], also returning the ranked alternatives.
pub async fn calibrate_with_candidates<F>(
    fetcher: &F,
    url: &str,
    observed: &str,
    target_price: f64,
) -> Result<CalibrationReport>
where
    F: PageFetcher + ?Sized,
{
    let initial_price = parse_observed(url, observed, target_price)?;
    let url = url.trim();

    info!("Calibrating {} for {}", url, initial_price);
    let html = fetch_rendered_html(fetcher, url, None).await?;

    calibrate_html(url, &html, initial_price, target_price)
}

/// Runs locate, score and synthesis over already-fetched HTML.
pub fn calibrate_html(
    url: &str,
    html: &str,
    initial_price: f64,
    target_price: f64,
) -> Result<CalibrationReport> {
    let document = Html::parse_document(html);
    let scored = find_candidates(&document, initial_price);

    let candidates: Vec<RankedCandidate> = scored
        .iter()
        .map(|s| RankedCandidate {
            selector: synthesize(s.candidate.element).to_string(),
            score: s.score,
            tag: s.candidate.tag().to_string(),
            text: s.candidate.raw_text.clone(),
        })
        .collect();

    let Some(best) = candidates.first() else {
        return Err(Error::PriceNotFound(url.to_string()));
    };

    debug!("Best candidate <{}> scored {}: {}", best.tag, best.score, best.selector);

    match price_at_selector(&document, &best.selector) {
        Ok(price) if same_price(price, initial_price) => {}
        Ok(price) => warn!("Selector {} replays as {}, not {}", best.selector, price, initial_price),
        Err(reason) => warn!("Selector {} does not replay cleanly: {}", best.selector, reason),
    }

    let result = CalibrationResult {
        url: url.to_string(),
        selector: best.selector.clone(),
        initial_price,
        target_price,
    };

    Ok(CalibrationReport { result, candidates })
}
