//! Autocomplete provider seam and menu state.

use crate::text::{graphemes, is_punctuation, is_whitespace};

/// One completion candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    /// Replacement text.
    pub text: String,
    /// Grapheme column on the current line where replacement starts.
    pub replace_from: usize,
}

/// Supplies completion candidates for a cursor position.
pub trait CompletionProvider {
    /// Candidates for `line` with the cursor at grapheme `col`.
    fn complete(&self, line: &str, col: usize) -> Vec<Suggestion>;
}

/// Completes the word before the cursor against a fixed word list.
#[derive(Clone, Debug, Default)]
pub struct WordListProvider {
    words: Vec<String>,
}

impl WordListProvider {
    /// Create a provider over the given words.
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }
}

impl CompletionProvider for WordListProvider {
    fn complete(&self, line: &str, col: usize) -> Vec<Suggestion> {
        let clusters = graphemes(line);
        let col = col.min(clusters.len());
        let mut start = col;
        while start > 0 && !is_whitespace(clusters[start - 1]) && !is_punctuation(clusters[start - 1])
        {
            start -= 1;
        }
        let prefix: String = clusters[start..col].concat();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.words
            .iter()
            .filter(|w| w.starts_with(&prefix) && w.as_str() != prefix)
            .map(|w| Suggestion {
                text: w.clone(),
                replace_from: start,
            })
            .collect()
    }
}

/// Open-menu state inside the editor.
#[derive(Debug, Default)]
pub struct AutocompleteState {
    suggestions: Vec<Suggestion>,
    selected: usize,
}

impl AutocompleteState {
    /// Open the menu with candidates; empty input closes it.
    pub fn open(&mut self, suggestions: Vec<Suggestion>) {
        self.suggestions = suggestions;
        self.selected = 0;
    }

    /// Close the menu.
    pub fn close(&mut self) {
        self.suggestions.clear();
        self.selected = 0;
    }

    /// Whether the menu is showing.
    pub fn is_open(&self) -> bool {
        !self.suggestions.is_empty()
    }

    /// Move selection down, wrapping.
    pub fn select_next(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + 1) % self.suggestions.len();
        }
    }

    /// Move selection up, wrapping.
    pub fn select_previous(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + self.suggestions.len() - 1) % self.suggestions.len();
        }
    }

    /// The selected candidate.
    pub fn current(&self) -> Option<&Suggestion> {
        self.suggestions.get(self.selected)
    }

    /// All candidates with the selected index.
    pub fn entries(&self) -> (&[Suggestion], usize) {
        (&self.suggestions, self.selected)
    }
}
