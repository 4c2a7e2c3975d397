//! Deduplicated warnings for unsupported layout features.
//!
//! Style trees produced upstream routinely carry properties the engine does
//! not implement (grid placement, sticky offsets, exotic units). Each unique
//! message is reported once per [`WarningSet`] through the `log` facade so a
//! large document does not flood the output. A layout run owns its own set,
//! so concurrent or repeated runs never hide each other's warnings.

use std::cell::RefCell;
use std::collections::HashSet;

/// Warnings already emitted by one owner, usually one layout run.
///
/// Recording goes through `&self` so read-only traversals can warn too.
#[derive(Debug, Default)]
pub struct WarningSet {
    seen: RefCell<HashSet<String>>,
}

impl WarningSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warn about an unsupported feature, logging only the first time this
    /// set sees the message. Returns whether it was logged.
    ///
    /// # Example
    /// ```
    /// let warnings = quire_common::warning::WarningSet::new();
    /// assert!(warnings.warn_once("layout", "position: sticky is laid out as static"));
    /// assert!(!warnings.warn_once("layout", "position: sticky is laid out as static"));
    /// ```
    pub fn warn_once(&self, component: &str, message: &str) -> bool {
        let key = format!("[{component}] {message}");
        let first_time = self.seen.borrow_mut().insert(key);
        if first_time {
            log::warn!(target: "quire", "[{component}] {message}");
        }
        first_time
    }

    /// Whether this exact message has been reported.
    #[must_use]
    pub fn was_warned(&self, component: &str, message: &str) -> bool {
        self.seen.borrow().contains(&format!("[{component}] {message}"))
    }

    /// Number of distinct messages reported.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    /// Whether nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_records_message() {
        let warnings = WarningSet::new();
        assert!(warnings.warn_once("Test", "recorded message"));
        assert!(!warnings.warn_once("Test", "recorded message"));
        assert!(warnings.was_warned("Test", "recorded message"));
        assert!(!warnings.was_warned("Test", "never emitted"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_sets_do_not_share_messages() {
        let first = WarningSet::new();
        let second = WarningSet::new();
        assert!(first.warn_once("Test", "same message"));
        assert!(second.warn_once("Test", "same message"));
        assert!(!second.is_empty());
        assert!(!WarningSet::new().was_warned("Test", "same message"));
    }
}
