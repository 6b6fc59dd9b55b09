//! Heuristic scoring rules for price candidates.
//!
//! Each rule looks at one property of a candidate and returns points; the
//! table sums them. The rules are fixed, so the same DOM always yields the
//! same ranking.

use super::{class_names, PriceCandidate, HIDDEN_CONTAINERS, PRICE_CLASS_KEYWORDS};
use scraper::ElementRef;

/// A single scoring rule.
pub trait Rule: Send + Sync {
    /// Stable rule name, used in score breakdowns.
    fn name(&self) -> &'static str;

    /// Points this rule awards (negative for penalties).
    fn score(&self, candidate: &PriceCandidate<'_>) -> i32;
}

/// Prefers inline text tags that shops typically render prices in.
pub struct TagNameRule;

impl Rule for TagNameRule {
    fn name(&self) -> &'static str {
        "tag-name"
    }

    fn score(&self, candidate: &PriceCandidate<'_>) -> i32 {
        match candidate.tag() {
            "span" | "strong" | "b" => 3,
            "div" | "p" => 1,
            _ => 0,
        }
    }
}

/// Penalizes elements that live inside non-rendered containers.
pub struct AncestorRule;

impl Rule for AncestorRule {
    fn name(&self) -> &'static str {
        "ancestor"
    }

    fn score(&self, candidate: &PriceCandidate<'_>) -> i32 {
        let hidden = candidate
            .element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| HIDDEN_CONTAINERS.contains(&a.value().name()));

        if hidden {
            -5
        } else {
            0
        }
    }
}

/// Rewards class names mentioning a price keyword.
pub struct ClassKeywordRule;

impl Rule for ClassKeywordRule {
    fn name(&self) -> &'static str {
        "class-keyword"
    }

    fn score(&self, candidate: &PriceCandidate<'_>) -> i32 {
        if class_contains(candidate, PRICE_CLASS_KEYWORDS) {
            5
        } else {
            0
        }
    }
}

/// Penalizes struck-through / previous prices.
pub struct StalePriceRule;

impl Rule for StalePriceRule {
    fn name(&self) -> &'static str {
        "stale-price"
    }

    fn score(&self, candidate: &PriceCandidate<'_>) -> i32 {
        if class_contains(candidate, &["old-price", "previous"]) {
            -1
        } else {
            0
        }
    }
}

/// Prices are short strings; long text is usually a description.
pub struct TextLengthRule;

impl Rule for TextLengthRule {
    fn name(&self) -> &'static str {
        "text-length"
    }

    fn score(&self, candidate: &PriceCandidate<'_>) -> i32 {
        match candidate.text_len {
            n if n < 30 => 2,
            n if n > 80 => -2,
            _ => 0,
        }
    }
}

fn class_contains(candidate: &PriceCandidate<'_>, keywords: &[&str]) -> bool {
    class_names(candidate.element).any(|class| {
        let class = class.to_lowercase();
        keywords.iter().any(|k| class.contains(k))
    })
}

/// An ordered table of rules whose points are summed.
pub struct ScoreTable {
    rules: Vec<Box<dyn Rule>>,
}

impl ScoreTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The standard price-locating table.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table
            .add(TagNameRule)
            .add(AncestorRule)
            .add(ClassKeywordRule)
            .add(StalePriceRule)
            .add(TextLengthRule);
        table
    }

    /// Adds a rule to the table.
    pub fn add(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Total score for a candidate.
    pub fn score(&self, candidate: &PriceCandidate<'_>) -> i32 {
        self.rules.iter().map(|r| r.score(candidate)).sum()
    }

    /// Per-rule points, in table order.
    pub fn breakdown(&self, candidate: &PriceCandidate<'_>) -> Vec<(&'static str, i32)> {
        self.rules.iter().map(|r| (r.name(), r.score(candidate))).collect()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::standard()
    }
}
