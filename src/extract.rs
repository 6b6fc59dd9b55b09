//! Extraction engine: stored selector first, heuristic search second.
//!
//! ```text
//! Start -> SelectorAttempt -> Success
//!                          \-> FallbackSearch -> Success | NotFound
//! ```
//!
//! A stale selector is not an error; it only costs a warning and a fallback.

use crate::error::{Error, Result};
use crate::fetch::{fetch_rendered_html, PageFetcher};
use crate::locate::{has_class_keyword, visible_text, PRICE_CLASS_KEYWORDS};
use crate::price::parse_price;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Text shorter than this counts as a concise price display.
pub const SHORT_TEXT_LIMIT: usize = 30;

/// Generic text-bearing tags scanned when no price-classed element parses.
static GENERIC_TAGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, p, strong, b").unwrap());

/// Which stage of the engine produced the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// The stored selector resolved cleanly.
    Selector,
    /// Fallback over price-classed elements.
    PriceClass,
    /// Fallback over generic text tags.
    GenericTag,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::Selector => write!(f, "selector"),
            PriceSource::PriceClass => write!(f, "price-class fallback"),
            PriceSource::GenericTag => write!(f, "generic-tag fallback"),
        }
    }
}

/// A successfully extracted price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub price: f64,
    pub source: PriceSource,
}

/// Why a stored selector could not be used.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StaleSelector {
    #[error("selector does not parse: {0}")]
    Invalid(String),
    #[error("no element matches")]
    NoMatch,
    #[error("{0} elements match")]
    Ambiguous(usize),
    #[error("text '{0}' holds no price")]
    Unparsable(String),
}

enum State<'s> {
    Start,
    SelectorAttempt(&'s str),
    FallbackSearch,
    Success(Extraction),
    NotFound,
}

/// Runs the engine over a parsed document.
pub fn extract_from_document(document: &Html, selector: Option<&str>) -> Option<Extraction> {
    let mut state = State::Start;

    loop {
        state = match state {
            State::Start => match selector.map(str::trim) {
                Some(css) if !css.is_empty() => State::SelectorAttempt(css),
                _ => State::FallbackSearch,
            },
            State::SelectorAttempt(css) => match price_at_selector(document, css) {
                Ok(price) => {
                    debug!("Stored selector resolved to {}", price);
                    State::Success(Extraction { price, source: PriceSource::Selector })
                }
                Err(reason) => {
                    warn!("Stored selector '{}' is stale ({}); falling back", css, reason);
                    State::FallbackSearch
                }
            },
            State::FallbackSearch => {
                fallback_search(document).map_or(State::NotFound, State::Success)
            }
            State::Success(extraction) => return Some(extraction),
            State::NotFound => return None,
        };
    }
}

/// Parses HTML and runs the engine over it.
pub fn extract_from_html(html: &str, selector: Option<&str>) -> Option<Extraction> {
    let document = Html::parse_document(html);
    extract_from_document(&document, selector)
}

/// Resolves a selector to exactly one element and parses its text.
pub fn price_at_selector(document: &Html, css: &str) -> std::result::Result<f64, StaleSelector> {
    let selector = Selector::parse(css).map_err(|e| StaleSelector::Invalid(format!("{:?}", e)))?;

    let mut matches = document.select(&selector);
    let Some(element) = matches.next() else {
        return Err(StaleSelector::NoMatch);
    };

    let extra = matches.count();
    if extra > 0 {
        return Err(StaleSelector::Ambiguous(extra + 1));
    }

    let text = visible_text(element);
    parse_price(&text).ok_or(StaleSelector::Unparsable(text))
}

/// A parsed value and the length of the text it came from.
#[derive(Debug, Clone, Copy)]
struct Sighting {
    value: f64,
    text_len: usize,
}

/// Price search with no target: price-classed elements, then generic tags.
fn fallback_search(document: &Html) -> Option<Extraction> {
    let classed = sightings(
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| has_class_keyword(*el, PRICE_CLASS_KEYWORDS)),
    );

    if let Some(price) = pick_price(&classed) {
        info!("Fallback picked {} from {} price-classed element(s)", price, classed.len());
        return Some(Extraction { price, source: PriceSource::PriceClass });
    }

    let generic = sightings(document.select(&GENERIC_TAGS));
    let price = pick_price(&generic)?;
    info!("Fallback picked {} from {} generic element(s)", price, generic.len());
    Some(Extraction { price, source: PriceSource::GenericTag })
}

fn sightings<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<Sighting> {
    elements
        .filter_map(|el| {
            let text = visible_text(el);
            let value = parse_price(&text).filter(|v| *v > 0.0)?;
            Some(Sighting { value, text_len: text.chars().count() })
        })
        .collect()
}

/// Minimum of the short-text sightings, else minimum of all.
fn pick_price(sightings: &[Sighting]) -> Option<f64> {
    let short = sightings.iter().filter(|s| s.text_len < SHORT_TEXT_LIMIT);
    min_value(short.map(|s| s.value)).or_else(|| min_value(sightings.iter().map(|s| s.value)))
}

fn min_value(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.min_by(f64::total_cmp)
}

/// Fetches a page and extracts its price, reporting the producing stage.
pub async fn check_price<F>(fetcher: &F, url: &str, selector: Option<&str>) -> Result<Extraction>
where
    F: PageFetcher + ?Sized,
{
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput("url is empty".to_string()));
    }

    info!("Checking price: {}", url);
    let stored = selector.map(str::trim).filter(|css| !css.is_empty());
    let html = fetch_rendered_html(fetcher, url, stored).await?;

    extract_from_html(&html, selector).ok_or_else(|| Error::PriceNotFound(url.to_string()))
}

/// Fetches a page and returns its current price.
pub async fn extract_price<F>(fetcher: &F, url: &str, selector: Option<&str>) -> Result<f64>
where
    F: PageFetcher + ?Sized,
{
    Ok(check_price(fetcher, url, selector).await?.price)
}
