pub mod head;
pub mod menu;
pub mod shortcode;

use crate::models::{ContentItem, HreflangEntry};

/// The content item being rendered and its resolved rows.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub item: &'a ContentItem,
    pub entries: &'a [HreflangEntry],
}

impl<'a> Page<'a> {
    pub fn new(item: &'a ContentItem, entries: &'a [HreflangEntry]) -> Self {
        Self { item, entries }
    }

    /// Whether `entry` points back at the page itself.
    pub fn is_current(&self, entry: &HreflangEntry) -> bool {
        entry.url == self.item.permalink
    }
}

/// Escape text for HTML bodies and double-quoted attributes.
pub(crate) fn escape(s: &str) -> String {
    htmlescape::encode_minimal(s)
}
