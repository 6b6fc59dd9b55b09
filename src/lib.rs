//! pricepin - pin a product price to a CSS selector and re-read it later
//!
//! Calibration turns a human-observed price string into a selector for the
//! element that shows it; extraction replays that selector against a fresh
//! render of the page and falls back to a heuristic search when it is stale.

pub mod calibrate;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod locate;
pub mod price;
pub mod selector;

pub use calibrate::{calibrate, CalibrationResult};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{extract_price, Extraction, PriceSource};
pub use fetch::{FetchChain, PageFetcher};
pub use price::parse_price;
