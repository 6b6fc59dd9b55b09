//! Error kinds surfaced by `calibrate` and `extract_price`.

use thiserror::Error;

/// Terminal failure of a single calibration or extraction call.
///
/// Nothing is retried inside the crate. Use [`Error::is_transient`] to decide
/// whether the next scheduled check should try again.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input (empty URL, empty observed text, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Text was present but no numeric pattern matched.
    #[error("no recognizable price in '{0}'")]
    Parse(String),

    /// Every fetch strategy failed for the URL.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The page was fetched but no candidate produced a price.
    #[error("price not found on {0}")]
    PriceNotFound(String),
}

impl Error {
    /// Returns true for failures that may resolve on a later check.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Fetch { .. } | Error::PriceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
