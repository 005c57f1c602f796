//! Kill ring: killed text entries with Emacs-style accumulation and
//! yank-pop rotation.

/// Maximum retained entries; the oldest is dropped beyond this.
const MAX_ENTRIES: usize = 60;

/// Ordered list of killed text. The most recent entry is yanked first;
/// consecutive kills in the same direction merge into one entry.
#[derive(Clone, Debug, Default)]
pub struct KillRing {
    entries: Vec<String>,
    /// Direction of the previous push (`true` = prepend/backward),
    /// `None` when the accumulation chain is broken.
    last_prepend: Option<bool>,
}

impl KillRing {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push killed text.
    ///
    /// With `accumulate`, a previous kill in the same direction is
    /// merged: backward kills (`prepend`) grow the entry at the front,
    /// forward kills at the back. Otherwise a new entry is appended.
    pub fn push(&mut self, text: String, prepend: bool, accumulate: bool) {
        if text.is_empty() {
            return;
        }
        let merge = accumulate && self.last_prepend == Some(prepend);
        match (merge, self.entries.last_mut()) {
            (true, Some(last)) => {
                if prepend {
                    last.insert_str(0, &text);
                } else {
                    last.push_str(&text);
                }
            }
            _ => {
                self.entries.push(text);
                if self.entries.len() > MAX_ENTRIES {
                    self.entries.remove(0);
                }
            }
        }
        self.last_prepend = Some(prepend);
    }

    /// End the accumulation chain; the next push starts a new entry.
    pub fn break_chain(&mut self) {
        self.last_prepend = None;
    }

    /// The most recent kill.
    pub fn peek(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Move the most recent entry to the front, exposing the next one
    /// (yank-pop cycling).
    pub fn rotate(&mut self) {
        if self.entries.len() > 1 {
            if let Some(last) = self.entries.pop() {
                self.entries.insert(0, last);
            }
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been killed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
