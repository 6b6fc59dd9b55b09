//! CSS selector synthesis for a located element.
//!
//! The path climbs from the element towards the document root, one segment
//! per level, and stops early at the first element carrying an `id`.

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root-to-leaf selector segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorPath {
    segments: Vec<String>,
}

impl SelectorPath {
    /// Segments from the outermost ancestor to the target.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true when the path is anchored on an id.
    pub fn is_id_anchored(&self) -> bool {
        self.segments.first().is_some_and(|s| s.starts_with('#'))
    }
}

impl fmt::Display for SelectorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(" > "))
    }
}

/// Builds the selector path for an element.
pub fn synthesize(element: ElementRef<'_>) -> SelectorPath {
    let mut segments = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        if let Some(id) = el.value().id().filter(|id| !id.is_empty()) {
            segments.push(format!("#{}", escape_ident(id)));
            break;
        }

        segments.push(segment(el));
        current = el.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    SelectorPath { segments }
}

/// `tag.class1.class2:nth-of-type(k)` for one element.
fn segment(el: ElementRef<'_>) -> String {
    let tag = el.value().name();
    let mut out = escape_ident(tag);

    for class in el.value().attr("class").unwrap_or_default().split_ascii_whitespace() {
        out.push('.');
        out.push_str(&escape_ident(class));
    }

    let position = 1 + el
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|s| s.value().name() == tag)
        .count();

    out.push_str(&format!(":nth-of-type({})", position));
    out
}

/// Escapes a CSS identifier so any attribute value survives a re-parse.
fn escape_ident(ident: &str) -> String {
    if ident == "-" {
        return "\\-".to_string();
    }

    let mut out = String::with_capacity(ident.len());
    let leading_dash = ident.starts_with('-');

    for (i, c) in ident.chars().enumerate() {
        let digit_at_start = c.is_ascii_digit() && (i == 0 || (i == 1 && leading_dash));

        if digit_at_start || c.is_control() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }

    out
}
