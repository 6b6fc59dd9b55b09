//! Price normalizer command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::price::parse_price;
use serde::Serialize;

/// Normalizer output for one input string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    pub text: String,
    pub price: Option<f64>,
}

/// Runs the price normalizer over text.
pub struct ParseCommand {
    config: Config,
}

impl ParseCommand {
    /// Creates a new parse command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parses the text and returns formatted output.
    pub fn execute(&self, text: &str) -> String {
        let report = ParseReport { text: text.to_string(), price: parse_price(text) };
        Formatter::new(self.config.format).format_parse(&report)
    }
}
