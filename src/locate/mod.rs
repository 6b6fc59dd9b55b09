//! Candidate location: which elements on a page show a given price.
//!
//! Candidates borrow from the parsed [`Html`] they were found in, so they
//! cannot outlive the document snapshot of a single fetch.

pub mod score;

use crate::price::{parse_price, same_price};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::{debug, trace};

pub use score::{Rule, ScoreTable};

/// Class keywords that mark price-bearing markup.
pub const PRICE_CLASS_KEYWORDS: &[&str] = &["price", "fiyat"];

/// Elements whose text never counts as visible page content.
pub const HIDDEN_CONTAINERS: &[&str] = &["script", "style", "noscript", "head"];

/// An element whose text parses to a price.
#[derive(Debug, Clone)]
pub struct PriceCandidate<'a> {
    /// The element, scoped to the document it came from.
    pub element: ElementRef<'a>,
    /// Text the value was parsed from.
    pub raw_text: String,
    /// Parsed price.
    pub value: f64,
    /// Length of `raw_text` in characters.
    pub text_len: usize,
}

impl<'a> PriceCandidate<'a> {
    fn new(element: ElementRef<'a>, raw_text: String, value: f64) -> Self {
        let text_len = raw_text.chars().count();
        Self { element, raw_text, value, text_len }
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        self.element.value().name()
    }

    /// Whitespace-separated class names, in attribute order.
    pub fn classes(&self) -> impl Iterator<Item = &'a str> {
        class_names(self.element)
    }
}

/// A candidate plus its heuristic rank.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub candidate: PriceCandidate<'a>,
    pub score: i32,
}

/// Element text with each text node trimmed and concatenated.
///
/// Split prices such as `<span>29</span><span>.99</span>` come out whole.
/// Two nodes that would put a digit right against a digit get a space
/// between them, so `<del>279,99</del><ins>229,99</ins>` stays two numbers.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();

    for chunk in element.text().map(str::trim).filter(|t| !t.is_empty()) {
        let glued = out.ends_with(|c: char| c.is_ascii_digit())
            && chunk.starts_with(|c: char| c.is_ascii_digit());
        if glued {
            out.push(' ');
        }
        out.push_str(chunk);
    }

    out
}

/// Class names of an element, in attribute order.
pub fn class_names<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element.value().attr("class").unwrap_or_default().split_ascii_whitespace()
}

/// True when any class name contains one of the keywords (case-insensitive).
pub fn has_class_keyword(element: ElementRef<'_>, keywords: &[&str]) -> bool {
    class_names(element).any(|class| {
        let class = class.to_lowercase();
        keywords.iter().any(|k| class.contains(k))
    })
}

/// Finds every element showing `target` and ranks them, best first.
pub fn find_candidates(document: &Html, target: f64) -> Vec<ScoredCandidate<'_>> {
    find_candidates_with(document, target, &ScoreTable::standard())
}

/// Like [`find_candidates`] with a custom rule table.
pub fn find_candidates_with<'a>(
    document: &'a Html,
    target: f64,
    table: &ScoreTable,
) -> Vec<ScoredCandidate<'a>> {
    let mut candidates = price_class_tier(document, target);
    if candidates.is_empty() {
        debug!("No price-classed element shows {}; scanning all text", target);
        candidates = text_node_tier(document, target);
    }

    let mut scored: Vec<ScoredCandidate<'a>> = candidates
        .into_iter()
        .map(|candidate| {
            let score = table.score(&candidate);
            trace!("Candidate <{}> '{}' scored {}", candidate.tag(), candidate.raw_text, score);
            ScoredCandidate { candidate, score }
        })
        .collect();

    // Stable: equal scores keep document order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    debug!("{} candidate(s) for {}", scored.len(), target);
    scored
}

/// Tier A: elements whose class mentions a price keyword.
fn price_class_tier(document: &Html, target: f64) -> Vec<PriceCandidate<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| has_class_keyword(*el, PRICE_CLASS_KEYWORDS))
        .filter_map(|el| {
            let text = visible_text(el);
            let value = parse_price(&text)?;
            same_price(value, target).then(|| PriceCandidate::new(el, text, value))
        })
        .collect()
}

/// Tier B: every visible text node, attributed to its parent element.
fn text_node_tier(document: &Html, target: f64) -> Vec<PriceCandidate<'_>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        if HIDDEN_CONTAINERS.contains(&parent.value().name()) {
            continue;
        }

        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let Some(value) = parse_price(text) else {
            continue;
        };

        if same_price(value, target) && seen.insert(parent.id()) {
            out.push(PriceCandidate::new(parent, text.to_string(), value));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_class_tier_wins() {
        let html = Html::parse_document(
            r#"<html><body>
                <p>Was 229,99 TL yesterday</p>
                <span class="product-price">229,99 TL</span>
            </body></html>"#,
        );

        let found = find_candidates(&html, 229.99);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate.tag(), "span");
        assert_eq!(found[0].candidate.raw_text, "229,99 TL");
    }

    #[test]
    fn test_fiyat_class_case_insensitive() {
        let html = Html::parse_document(r#"<div class="UrunFiyat"><b>1.299,00 TL</b></div>"#);

        let found = find_candidates(&html, 1299.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate.tag(), "div");
    }

    #[test]
    fn test_text_tier_when_no_price_classes() {
        let html = Html::parse_document(
            r#"<html><head><title>449,90 TL</title><script>var p = "449,90";</script></head>
               <body><div><strong>449,90 TL</strong></div><p>Other 12,00 TL</p></body></html>"#,
        );

        let found = find_candidates(&html, 449.9);
        let tags: Vec<_> = found.iter().map(|s| s.candidate.tag()).collect();

        // The <script> text is excluded; the <title> survives but is penalized.
        assert_eq!(tags, vec!["strong", "title"]);
        assert!(found[0].score > found[1].score);
    }

    #[test]
    fn test_text_tier_dedupes_parent() {
        let html = Html::parse_document(r#"<p>99,90 TL<br>99,90 TL</p>"#);
        assert_eq!(find_candidates(&html, 99.9).len(), 1);
    }

    #[test]
    fn test_no_match() {
        let html = Html::parse_document(r#"<span class="price">10,00 TL</span>"#);
        assert!(find_candidates(&html, 11.0).is_empty());
    }

    #[test]
    fn test_price_class_preferred_over_plain() {
        let html = Html::parse_document(
            r#"<html><body>
                <span class="label">Total</span>
                <span class="summary">59.90</span>
                <span class="price">59.90</span>
            </body></html>"#,
        );

        // Tier A only sees the price-classed span.
        let found = find_candidates(&html, 59.9);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate.classes().collect::<Vec<_>>(), vec!["price"]);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let html = Html::parse_document(
            r#"<span class="price first">5,00</span><span class="price second">5,00</span>"#,
        );

        let found = find_candidates(&html, 5.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].score, found[1].score);
        assert!(found[0].candidate.classes().any(|c| c == "first"));
    }

    #[test]
    fn test_split_digits_join() {
        let html = Html::parse_document(
            r#"<span class="a-price"><span>29</span><span>.99</span></span>"#,
        );
        let found = find_candidates(&html, 29.99);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate.raw_text, "29.99");
    }

    #[test]
    fn test_adjacent_prices_stay_apart() {
        let html = Html::parse_document(
            r#"<div class="price"><del>279,99</del><ins>229,99</ins></div>"#,
        );
        let div = html.select(&scraper::Selector::parse("div").unwrap()).next().unwrap();
        assert_eq!(visible_text(div), "279,99 229,99");

        // Neither sale nor list price is a 99229.99 candidate.
        assert!(find_candidates(&html, 99229.99).is_empty());
        assert_eq!(find_candidates(&html, 279.99).len(), 1);
    }
}
