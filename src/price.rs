//! Price text normalization.
//!
//! Turns free-form price strings such as `"1.234,56 TL"` or `"$12.34"` into a
//! plain `f64`. Locale is resolved by trying a fixed list of number shapes in
//! priority order; the first shape found in the text wins.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Currency symbols and codes stripped before matching, in removal order.
pub const CURRENCY_TOKENS: &[&str] = &["₺", "TL", "TRY", "$", "€", "EUR", "USD"];

/// One accepted number shape and the separators it uses.
struct NumberShape {
    regex: Regex,
    thousands: Option<char>,
    decimal: Option<char>,
}

impl NumberShape {
    fn new(pattern: &str, thousands: Option<char>, decimal: Option<char>) -> Self {
        Self { regex: Regex::new(pattern).unwrap(), thousands, decimal }
    }

    /// Finds the leftmost match that spans a whole number run.
    ///
    /// A match touching another digit, or a separator followed by a digit,
    /// is only part of a longer number and is skipped.
    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        let bytes = text.as_bytes();
        let mut start = 0;

        while let Some(m) = self.regex.find_at(text, start) {
            let before = continues_number(bytes, m.start().checked_sub(1), |i| i.checked_sub(1));
            let after = continues_number(bytes, Some(m.end()), |i| Some(i + 1));

            if !before && !after {
                return Some(m.as_str());
            }

            // Matches always begin with an ASCII digit, so +1 stays on a char boundary.
            start = m.start() + 1;
        }

        None
    }

    /// Rewrites a matched number into Rust's float syntax.
    fn normalize(&self, matched: &str) -> String {
        matched
            .chars()
            .filter(|c| Some(*c) != self.thousands)
            .map(|c| if Some(c) == self.decimal { '.' } else { c })
            .collect()
    }
}

/// True when the byte at `at` extends a number: a digit, or a `.`/`,`
/// whose next byte in the same direction is a digit.
fn continues_number(bytes: &[u8], at: Option<usize>, step: impl Fn(usize) -> Option<usize>) -> bool {
    let digit_at = |i: Option<usize>| i.and_then(|i| bytes.get(i)).is_some_and(u8::is_ascii_digit);

    match at.and_then(|i| bytes.get(i).map(|b| (i, *b))) {
        Some((_, b)) if b.is_ascii_digit() => true,
        Some((i, b'.' | b',')) => digit_at(step(i)),
        _ => false,
    }
}

/// Number shapes in priority order.
///
/// There is no shape for a thousands dot without decimals, so `"1.299 TL"`
/// has no match that spans its number and parses to `None` instead of 1.
static SHAPES: LazyLock<[NumberShape; 5]> = LazyLock::new(|| {
    [
        // 1.234,56
        NumberShape::new(r"\d{1,3}(?:\.\d{3})*,\d{2}", Some('.'), Some(',')),
        // 1,234.56
        NumberShape::new(r"\d{1,3}(?:,\d{3})*\.\d{2}", Some(','), Some('.')),
        // 12,99
        NumberShape::new(r"\d+,\d{2}", None, Some(',')),
        // 12.99
        NumberShape::new(r"\d+\.\d{2}", None, Some('.')),
        // 1299
        NumberShape::new(r"\d+", None, None),
    ]
});

/// Removes every known currency token from the text.
pub fn strip_currency(text: &str) -> String {
    CURRENCY_TOKENS.iter().fold(text.to_string(), |acc, token| acc.replace(token, ""))
}

/// Parses a price out of free text.
///
/// Returns `None` when the text contains no recognizable number.
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped = strip_currency(text);
    let cleaned = stripped.trim();

    let (shape, matched) = SHAPES.iter().find_map(|s| s.find(cleaned).map(|m| (s, m)))?;
    shape.normalize(matched).parse().ok()
}

/// Returns true when two prices are equal within the matching tolerance.
pub fn same_price(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_format() {
        assert_eq!(parse_price("1.234,56 TL"), Some(1234.56));
        assert_eq!(parse_price("229,99 TL"), Some(229.99));
        assert_eq!(parse_price("₺12.345,00"), Some(12345.0));
    }

    #[test]
    fn test_us_format() {
        assert_eq!(parse_price("$12.34"), Some(12.34));
        assert_eq!(parse_price("1,234.56 USD"), Some(1234.56));
        assert_eq!(parse_price("USD 1,234,567.89"), Some(1234567.89));
    }

    #[test]
    fn test_bare_decimals() {
        assert_eq!(parse_price("229,99"), Some(229.99));
        assert_eq!(parse_price("12.99"), Some(12.99));
        assert_eq!(parse_price("1234,56 EUR"), Some(1234.56));
        assert_eq!(parse_price("€ 1234.56"), Some(1234.56));
    }

    #[test]
    fn test_integer() {
        assert_eq!(parse_price("1299 TL"), Some(1299.0));
        assert_eq!(parse_price("Only 7 left"), Some(7.0));
    }

    #[test]
    fn test_no_digits() {
        assert_eq!(parse_price("no digits here"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("TL"), None);
    }

    #[test]
    fn test_text_around_number() {
        assert_eq!(parse_price("Sepette 199,90 TL"), Some(199.9));
        assert_eq!(parse_price("Price: $49.99 (incl. VAT)"), Some(49.99));
    }

    #[test]
    fn test_digit_boundary() {
        // The comma-decimal shape must not grab "1,23" out of a US number.
        assert_eq!(parse_price("1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_glued_prices_never_merge() {
        // Two prices with nothing between them: no shape may take digits from both.
        assert_eq!(parse_price("279,99229,99"), None);
        assert_eq!(parse_price("279,99 229,99"), Some(279.99));
    }

    #[test]
    fn test_thousands_dot_without_decimals() {
        // Not a recognized shape; refusing beats reading "1.299" as 1.
        assert_eq!(parse_price("1.299 TL"), None);
        assert_eq!(parse_price("1.299,00 TL"), Some(1299.0));
        assert_eq!(parse_price("Fiyat 99,90."), Some(99.9));
    }

    #[test]
    fn test_deterministic() {
        let text = "Fiyat: 2.499,00 TL";
        assert_eq!(parse_price(text), parse_price(text));
        assert_eq!(parse_price(text), Some(2499.0));
    }

    #[test]
    fn test_strip_currency() {
        assert_eq!(strip_currency("₺1.299,00 TRY"), "1.299,00 ");
        assert_eq!(strip_currency("$5 USD"), "5 ");
    }

    #[test]
    fn test_same_price() {
        assert!(same_price(229.99, 229.9905));
        assert!(!same_price(229.99, 229.98));
    }
}
