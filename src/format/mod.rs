//! Output formatting for calibration and check results (table, JSON).

use crate::calibrate::{CalibrationReport, RankedCandidate};
use crate::commands::{CheckReport, ParseReport};
use crate::config::OutputFormat;

/// Formats command results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a calibration; `list` adds every ranked candidate.
    pub fn format_calibration(&self, report: &CalibrationReport, list: bool) -> String {
        match self.format {
            OutputFormat::Json if list => to_json(report),
            OutputFormat::Json => to_json(&report.result),
            OutputFormat::Table => self.table_calibration(report, list),
        }
    }

    /// Formats a price check.
    pub fn format_check(&self, report: &CheckReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Table => self.table_check(report),
        }
    }

    /// Formats a normalizer run.
    pub fn format_parse(&self, report: &ParseReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Table => match report.price {
                Some(price) => format!("{:.2}", price),
                None => format!("No price in '{}'", report.text),
            },
        }
    }

    // Table formatting

    fn table_calibration(&self, report: &CalibrationReport, list: bool) -> String {
        let result = &report.result;
        let mut lines = vec![
            format!("URL:       {}", result.url),
            format!("Selector:  {}", result.selector),
            format!("Price:     {:.2}", result.initial_price),
            format!("Target:    {:.2}", result.target_price),
        ];

        if list {
            lines.push(String::new());
            lines.push(self.table_candidates(&report.candidates));
        }

        lines.join("\n")
    }

    fn table_candidates(&self, candidates: &[RankedCandidate]) -> String {
        let rank_width = 4;
        let score_width = 5;
        let tag_width = 8;
        let text_width = 24;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<rank_width$}  {:>score_width$}  {:<tag_width$}  {:<text_width$}  {}",
            "#", "Score", "Tag", "Text", "Selector"
        ));
        lines.push(format!(
            "{:-<rank_width$}  {:-<score_width$}  {:-<tag_width$}  {:-<text_width$}  {:-<40}",
            "", "", "", "", ""
        ));

        for (i, candidate) in candidates.iter().enumerate() {
            lines.push(format!(
                "{:<rank_width$}  {:>score_width$}  {:<tag_width$}  {:<text_width$}  {}",
                i + 1,
                candidate.score,
                candidate.tag,
                truncate(&candidate.text, text_width),
                candidate.selector
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} candidates", candidates.len()));

        lines.join("\n")
    }

    fn table_check(&self, report: &CheckReport) -> String {
        let mut lines = vec![
            format!("URL:       {}", report.url),
            format!("Price:     {:.2}", report.price),
            format!("Source:    {}", report.source),
        ];

        if let Some(selector) = &report.selector {
            lines.push(format!("Selector:  {}", selector));
        }

        if let (Some(target), Some(reached)) = (report.target_price, report.target_reached) {
            let status = if reached { "REACHED" } else { "not reached" };
            lines.push(format!("Target:    {:.2} ({})", target, status));
        }

        lines.join("\n")
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Shortens text to `width` characters, marking the cut with "...".
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
