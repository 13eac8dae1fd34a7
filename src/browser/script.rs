//! JavaScript evaluated in the dashboard page
//!
//! Arguments are embedded as JSON literals, which are valid JavaScript
//! string literals, so any text (quotes, backslashes, newlines, unicode)
//! reaches the page unchanged.

use serde::Deserialize;

fn literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// `true` if some element matching `selector` has text exactly `text`
pub fn any_text_equals(selector: &str, text: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll({})).some(el => (el.textContent ?? '') === {})",
        literal(selector),
        literal(text)
    )
}

/// `true` if some element matching `selector` has text containing `needle`
pub fn any_text_contains(selector: &str, needle: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll({})).some(el => (el.textContent ?? '').includes({}))",
        literal(selector),
        literal(needle)
    )
}

/// Snapshot of page load progress used to decide when the network settled
pub const PAGE_ACTIVITY: &str = "({ readyState: document.readyState, resources: performance.getEntriesByType('resource').length })";

/// Installed on every new document before its own scripts run
///
/// Chrome stops recording resource timing entries after 250 by default, and
/// a capped count would make a page that is still loading look idle.
/// The raised cap is 100000 entries per document.
pub const RESOURCE_TIMING_BUFFER: &str = "performance.setResourceTimingBufferSize(100000)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageActivity {
    pub ready_state: ReadyState,
    pub resources: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}
