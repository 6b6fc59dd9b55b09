//! Selectors and scripts the browser fetcher drives the page with.
//!
//! Update this file when a shop's consent dialog or price markup stops being
//! recognized; the rest of the fetcher only iterates these tables.

/// Something on the page that closes an overlay when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupTarget {
    /// A `<button>` whose visible label matches (case-insensitive).
    ButtonText(&'static str),
    /// Any element matching a CSS selector.
    Css(&'static str),
}

/// Overlay/consent dismissal attempts, tried in order.
pub const POPUP_TARGETS: &[PopupTarget] = &[
    PopupTarget::ButtonText("Kabul Et"),
    PopupTarget::ButtonText("Kapat"),
    PopupTarget::ButtonText("Tamam"),
    PopupTarget::ButtonText("Accept"),
    PopupTarget::ButtonText("Close"),
    PopupTarget::ButtonText("OK"),
    PopupTarget::ButtonText("X"),
    PopupTarget::Css("[class*='close']"),
    PopupTarget::Css("[class*='modal-close']"),
];

/// Price-bearing markup that signals a hydrated product page.
pub const PRICE_READY: &[&str] = &[
    "span[class*='prc-dsc']",
    "span[class*='prc-org']",
    "span[class*='selling-price']",
    "span[class*='product-price']",
];

/// Scrolls to the bottom so lazy-loaded sections attach.
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight); true";

/// Returns all ready-markers as one selector list.
pub fn price_ready_selector() -> String {
    PRICE_READY.join(", ")
}

/// The selector a render waits for: the stored one when it parses, else
/// the generic price markers.
pub fn ready_selector(stored: Option<&str>) -> String {
    match stored.map(str::trim).filter(|css| !css.is_empty()) {
        Some(css) if scraper::Selector::parse(css).is_ok() => css.to_string(),
        Some(css) => {
            tracing::debug!("Stored selector '{}' does not parse; waiting for price markers", css);
            price_ready_selector()
        }
        None => price_ready_selector(),
    }
}

impl PopupTarget {
    /// Builds a script that clicks the first match and reports whether it did.
    pub fn click_script(&self) -> String {
        match self {
            PopupTarget::ButtonText(label) => {
                let label = serde_json::to_string(&label.to_lowercase()).unwrap_or_default();
                format!(
                    r#"(() => {{
    const label = {label};
    const el = Array.from(document.querySelectorAll('button')).find(b => {{
        const text = (b.innerText || '').trim().toLowerCase();
        return label.length > 1 ? text.includes(label) : text === label;
    }});
    if (!el) return false;
    el.click();
    return true;
}})()"#
                )
            }
            PopupTarget::Css(css) => {
                let css = serde_json::to_string(css).unwrap_or_default();
                format!(
                    r#"(() => {{
    const el = document.querySelector({css});
    if (!el) return false;
    el.click();
    return true;
}})()"#
                )
            }
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            PopupTarget::ButtonText(label) | PopupTarget::Css(label) => *label,
        }
    }
}
