//! Content store for the source text.
//!
//! The store owns the current markdown source as an opaque string. The
//! editor buffer is the single writer; the render pipeline reads the whole
//! value on every change. Change notification is a monotonically increasing
//! revision counter that consumers compare against the last revision they
//! processed.

/// Holds the current source document and its revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStore {
    text: String,
    revision: u64,
}

impl ContentStore {
    /// Create a store seeded with initial text. The seed counts as the
    /// first revision so consumers render it on startup.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: 1,
        }
    }

    /// The current source text.
    pub fn get(&self) -> &str {
        &self.text
    }

    /// Replace the source text, bumping the revision when it changed.
    pub fn set(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        self.revision += 1;
    }

    /// Current revision. Consumers compare this with the revision they
    /// last rendered to detect changes.
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_counts_as_a_revision() {
        let store = ContentStore::new("# hi");
        assert_eq!(store.get(), "# hi");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_set_bumps_revision() {
        let mut store = ContentStore::new("a");
        store.set("b");
        assert_eq!(store.revision(), 2);
        assert_eq!(store.get(), "b");
    }

    #[test]
    fn test_identical_set_does_not_notify() {
        let mut store = ContentStore::new("same");
        store.set("same");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_sequential_edits_accumulate_revisions() {
        let mut store = ContentStore::default();
        store.set("a");
        store.set("ab");
        store.set("abc");
        assert_eq!(store.revision(), 4);
        assert_eq!(store.get(), "abc");
    }
}
