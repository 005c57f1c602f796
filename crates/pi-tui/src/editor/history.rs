//! Input history with draft preservation.

/// Maximum retained entries.
const MAX_ENTRIES: usize = 200;

/// Submitted-input history navigated with up/down at the buffer edges.
///
/// Starting navigation stashes the in-progress draft; walking past the
/// newest entry restores it.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<String>,
    /// Index into `entries` while navigating, newest-first walk.
    cursor: Option<usize>,
    draft: Option<String>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a submitted entry. Empty entries and immediate
    /// duplicates are skipped. Resets navigation.
    pub fn push(&mut self, entry: String) {
        self.cursor = None;
        self.draft = None;
        if entry.is_empty() || self.entries.last() == Some(&entry) {
            return;
        }
        self.entries.push(entry);
        if self.entries.len() > MAX_ENTRIES {
            self.entries.remove(0);
        }
    }

    /// Step to the previous (older) entry. On first call the current
    /// editor text is stashed as the draft. Returns `None` at the
    /// oldest entry (benign underflow).
    pub fn previous(&mut self, current: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let next_index = match self.cursor {
            None => {
                self.draft = Some(current.to_string());
                self.entries.len() - 1
            }
            Some(0) => return None,
            Some(i) => i - 1,
        };
        self.cursor = Some(next_index);
        self.entries.get(next_index).cloned()
    }

    /// Step to the next (newer) entry; walking past the newest returns
    /// the stashed draft and ends navigation.
    pub fn next(&mut self) -> Option<String> {
        let index = self.cursor?;
        if index + 1 < self.entries.len() {
            self.cursor = Some(index + 1);
            return self.entries.get(index + 1).cloned();
        }
        self.cursor = None;
        Some(self.draft.take().unwrap_or_default())
    }

    /// Whether history navigation is in progress.
    pub fn navigating(&self) -> bool {
        self.cursor.is_some()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_walks_newest_first() {
        let mut history = History::new();
        history.push("one".into());
        history.push("two".into());
        assert_eq!(history.previous("draft"), Some("two".into()));
        assert_eq!(history.previous("two"), Some("one".into()));
        assert_eq!(history.previous("one"), None);
    }

    #[test]
    fn next_restores_draft() {
        let mut history = History::new();
        history.push("one".into());
        assert_eq!(history.previous("my draft"), Some("one".into()));
        assert_eq!(history.next(), Some("my draft".into()));
        assert!(!history.navigating());
    }

    #[test]
    fn next_without_navigation_is_noop() {
        let mut history = History::new();
        history.push("one".into());
        assert_eq!(history.next(), None);
    }

    #[test]
    fn duplicates_and_empties_skipped() {
        let mut history = History::new();
        history.push("same".into());
        history.push("same".into());
        history.push(String::new());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn push_resets_navigation() {
        let mut history = History::new();
        history.push("one".into());
        let _ = history.previous("draft");
        history.push("two".into());
        assert!(!history.navigating());
        assert_eq!(history.previous(""), Some("two".into()));
    }

    #[test]
    fn empty_history_underflow_is_benign() {
        let mut history = History::new();
        assert_eq!(history.previous("draft"), None);
        assert_eq!(history.next(), None);
    }
}
