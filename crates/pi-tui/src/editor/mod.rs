//! Multi-line editor component.
//!
//! Grapheme-aware cursor and editing, Emacs-style kill operations
//! feeding a kill ring, snapshot undo with word coalescing, submitted
//! input history, and provider-backed autocomplete. While focused, the
//! editor embeds the cursor marker so the engine can park the hardware
//! cursor for IME candidate windows.

mod autocomplete;
mod history;
mod keybindings;
mod kill_ring;
mod undo;

pub use autocomplete::{AutocompleteState, CompletionProvider, Suggestion, WordListProvider};
pub use history::History;
pub use keybindings::{
    EditorAction, EditorKeybindings, lookup_editor_action, set_editor_keybindings,
};
pub use kill_ring::KillRing;
pub use undo::{EditorSnapshot, SnapshotUndo};

use crate::component::{CURSOR_MARKER, Component};
use crate::input::{KeyEventKind, parse_key, printable_text};
use crate::text::{
    grapheme_width, graphemes, next_word_boundary, prev_word_boundary, truncate,
};

const UNDO_DEPTH: usize = 200;
/// Menu rows shown at most.
const MENU_ROWS: usize = 8;

/// Span of the most recent yank, for yank-pop replacement.
struct YankSpan {
    line: usize,
    col: usize,
}

/// Multi-line text editor.
pub struct Editor {
    lines: Vec<String>,
    cursor_line: usize,
    cursor_col: usize,
    /// Sticky column for vertical motion.
    desired_col: Option<usize>,
    focused: bool,
    undo: SnapshotUndo,
    kill_ring: KillRing,
    history: History,
    provider: Option<Box<dyn CompletionProvider>>,
    autocomplete: AutocompleteState,
    last_yank: Option<YankSpan>,
    on_submit: Option<Box<dyn FnMut(String)>>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an empty editor.
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            desired_col: None,
            focused: false,
            undo: SnapshotUndo::new(UNDO_DEPTH),
            kill_ring: KillRing::new(),
            history: History::new(),
            provider: None,
            autocomplete: AutocompleteState::default(),
            last_yank: None,
            on_submit: None,
        }
    }

    /// Install a completion provider (Tab triggers it).
    pub fn set_completion_provider(&mut self, provider: Box<dyn CompletionProvider>) {
        self.provider = Some(provider);
    }

    /// Install the submit callback (plain Enter).
    pub fn on_submit(&mut self, callback: impl FnMut(String) + 'static) {
        self.on_submit = Some(Box::new(callback));
    }

    /// Whole buffer as one string.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the buffer, cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor_line = self.lines.len() - 1;
        self.cursor_col = graphemes(&self.lines[self.cursor_line]).len();
        self.desired_col = None;
    }

    /// True when the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Cursor as `(line, grapheme column)`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    /// The submitted-input history.
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            lines: self.lines.clone(),
            cursor_line: self.cursor_line,
            cursor_col: self.cursor_col,
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        self.lines = snapshot.lines;
        self.cursor_line = snapshot.cursor_line.min(self.lines.len() - 1);
        let len = graphemes(&self.lines[self.cursor_line]).len();
        self.cursor_col = snapshot.cursor_col.min(len);
        self.desired_col = None;
    }

    fn current_line(&self) -> &str {
        &self.lines[self.cursor_line]
    }

    fn byte_at(line: &str, col: usize) -> usize {
        graphemes(line)
            .iter()
            .take(col)
            .map(|g| g.len())
            .sum()
    }

    /// Insert text at the cursor, recording an undo snapshot. Word
    /// characters coalesce into the open typing group.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let coalesce = text.chars().all(char::is_alphanumeric);
        self.undo.record(self.snapshot(), coalesce);
        self.insert_raw(text);
        self.after_edit();
    }

    /// Splice text in without touching undo state.
    fn insert_raw(&mut self, text: &str) {
        let byte = Self::byte_at(self.current_line(), self.cursor_col);
        let tail = self.lines[self.cursor_line].split_off(byte);
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.lines[self.cursor_line].push_str(first);
            self.cursor_col += graphemes(first).len();
        }
        for part in parts {
            self.cursor_line += 1;
            self.lines.insert(self.cursor_line, part.to_string());
            self.cursor_col = graphemes(part).len();
        }
        let line = &mut self.lines[self.cursor_line];
        line.push_str(&tail);
    }

    /// Insert a line break at the cursor.
    pub fn insert_newline(&mut self) {
        self.undo.record(self.snapshot(), false);
        self.insert_raw("\n");
        self.after_edit();
    }

    /// Delete the grapheme before the cursor, joining lines at column
    /// zero.
    pub fn delete_backward(&mut self) {
        if self.cursor_col == 0 && self.cursor_line == 0 {
            return;
        }
        self.undo.record(self.snapshot(), false);
        if self.cursor_col > 0 {
            let start = Self::byte_at(self.current_line(), self.cursor_col - 1);
            let end = Self::byte_at(self.current_line(), self.cursor_col);
            self.lines[self.cursor_line].replace_range(start..end, "");
            self.cursor_col -= 1;
        } else {
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = graphemes(&self.lines[self.cursor_line]).len();
            self.lines[self.cursor_line].push_str(&current);
        }
        self.after_edit();
    }

    /// Delete the grapheme under the cursor, joining lines at line end.
    pub fn delete_forward(&mut self) {
        let len = graphemes(self.current_line()).len();
        if self.cursor_col >= len {
            if self.cursor_line + 1 >= self.lines.len() {
                return;
            }
            self.undo.record(self.snapshot(), false);
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        } else {
            self.undo.record(self.snapshot(), false);
            let start = Self::byte_at(self.current_line(), self.cursor_col);
            let end = Self::byte_at(self.current_line(), self.cursor_col + 1);
            self.lines[self.cursor_line].replace_range(start..end, "");
        }
        self.after_edit();
    }

    /// Kill the word before the cursor into the kill ring.
    pub fn delete_word_backward(&mut self) {
        if self.cursor_col == 0 {
            if self.cursor_line > 0 {
                self.undo.record(self.snapshot(), false);
                let current = self.lines.remove(self.cursor_line);
                self.cursor_line -= 1;
                self.cursor_col = graphemes(&self.lines[self.cursor_line]).len();
                self.lines[self.cursor_line].push_str(&current);
                self.kill_ring.push("\n".into(), true, true);
                self.after_kill();
            }
            return;
        }
        self.undo.record(self.snapshot(), false);
        let clusters = graphemes(self.current_line());
        let target = prev_word_boundary(&clusters, self.cursor_col);
        let killed: String = clusters[target..self.cursor_col].concat();
        let start = Self::byte_at(self.current_line(), target);
        let end = Self::byte_at(self.current_line(), self.cursor_col);
        self.lines[self.cursor_line].replace_range(start..end, "");
        self.cursor_col = target;
        self.kill_ring.push(killed, true, true);
        self.after_kill();
    }

    /// Kill the word after the cursor into the kill ring.
    pub fn delete_word_forward(&mut self) {
        let clusters = graphemes(self.current_line());
        if self.cursor_col >= clusters.len() {
            if self.cursor_line + 1 < self.lines.len() {
                self.undo.record(self.snapshot(), false);
                let next = self.lines.remove(self.cursor_line + 1);
                self.lines[self.cursor_line].push_str(&next);
                self.kill_ring.push("\n".into(), false, true);
                self.after_kill();
            }
            return;
        }
        self.undo.record(self.snapshot(), false);
        let clusters = graphemes(self.current_line());
        let target = next_word_boundary(&clusters, self.cursor_col);
        let killed: String = clusters[self.cursor_col..target].concat();
        let start = Self::byte_at(self.current_line(), self.cursor_col);
        let end = Self::byte_at(self.current_line(), target);
        self.lines[self.cursor_line].replace_range(start..end, "");
        self.kill_ring.push(killed, false, true);
        self.after_kill();
    }

    /// Kill from the cursor to the end of the line (the newline when
    /// already at the end).
    pub fn kill_to_line_end(&mut self) {
        let len = graphemes(self.current_line()).len();
        if self.cursor_col >= len {
            if self.cursor_line + 1 < self.lines.len() {
                self.undo.record(self.snapshot(), false);
                let next = self.lines.remove(self.cursor_line + 1);
                self.lines[self.cursor_line].push_str(&next);
                self.kill_ring.push("\n".into(), false, true);
                self.after_kill();
            }
            return;
        }
        self.undo.record(self.snapshot(), false);
        let start = Self::byte_at(self.current_line(), self.cursor_col);
        let killed = self.lines[self.cursor_line].split_off(start);
        self.kill_ring.push(killed, false, true);
        self.after_kill();
    }

    /// Kill from the start of the line to the cursor.
    pub fn kill_to_line_start(&mut self) {
        if self.cursor_col == 0 {
            return;
        }
        self.undo.record(self.snapshot(), false);
        let end = Self::byte_at(self.current_line(), self.cursor_col);
        let killed: String = self.lines[self.cursor_line][..end].to_string();
        self.lines[self.cursor_line].replace_range(..end, "");
        self.cursor_col = 0;
        self.kill_ring.push(killed, true, true);
        self.after_kill();
    }

    /// Insert the most recent kill at the cursor. No-op on an empty
    /// ring.
    pub fn yank(&mut self) {
        let Some(text) = self.kill_ring.peek().map(str::to_string) else {
            return;
        };
        self.undo.record(self.snapshot(), false);
        let span = YankSpan {
            line: self.cursor_line,
            col: self.cursor_col,
        };
        self.insert_raw(&text);
        self.after_edit();
        self.last_yank = Some(span);
    }

    /// Replace the text of the immediately-preceding yank with the
    /// next kill-ring entry. No-op unless the last action was a yank.
    pub fn yank_pop(&mut self) {
        let Some(span) = self.last_yank.take() else {
            return;
        };
        self.undo.record(self.snapshot(), false);
        self.delete_range(span.line, span.col, self.cursor_line, self.cursor_col);
        self.kill_ring.rotate();
        let text = self.kill_ring.peek().map(str::to_string).unwrap_or_default();
        let new_span = YankSpan {
            line: self.cursor_line,
            col: self.cursor_col,
        };
        self.insert_raw(&text);
        self.after_edit();
        self.last_yank = Some(new_span);
    }

    fn delete_range(&mut self, start_line: usize, start_col: usize, end_line: usize, end_col: usize) {
        if start_line == end_line {
            let from = Self::byte_at(&self.lines[start_line], start_col);
            let to = Self::byte_at(&self.lines[start_line], end_col);
            self.lines[start_line].replace_range(from..to, "");
        } else {
            let from = Self::byte_at(&self.lines[start_line], start_col);
            let tail_from = Self::byte_at(&self.lines[end_line], end_col);
            let tail = self.lines[end_line][tail_from..].to_string();
            self.lines[start_line].truncate(from);
            self.lines[start_line].push_str(&tail);
            self.lines.drain(start_line + 1..=end_line);
        }
        self.cursor_line = start_line;
        self.cursor_col = start_col;
    }

    /// Undo the last edit group.
    pub fn undo(&mut self) {
        let current = self.snapshot();
        if let Some(snapshot) = self.undo.undo(current) {
            self.restore(snapshot);
        }
        self.break_chains();
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) {
        let current = self.snapshot();
        if let Some(snapshot) = self.undo.redo(current) {
            self.restore(snapshot);
        }
        self.break_chains();
    }

    /// Move the cursor to the next occurrence of `target` on the
    /// current line. The cursor does not move when there is none.
    pub fn jump_to_char(&mut self, target: char) {
        let clusters = graphemes(self.current_line());
        for (i, g) in clusters.iter().enumerate().skip(self.cursor_col + 1) {
            if g.chars().next() == Some(target) {
                self.cursor_col = i;
                break;
            }
        }
        self.after_motion();
    }

    fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = graphemes(self.current_line()).len();
        }
        self.after_motion();
    }

    fn move_right(&mut self) {
        let len = graphemes(self.current_line()).len();
        if self.cursor_col < len {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
        self.after_motion();
    }

    fn move_up(&mut self) {
        if self.cursor_line == 0 {
            let current = self.text();
            if let Some(entry) = self.history.previous(&current) {
                self.set_text(&entry);
            }
            self.break_chains();
            return;
        }
        let desired = *self.desired_col.get_or_insert(self.cursor_col);
        self.cursor_line -= 1;
        self.cursor_col = desired.min(graphemes(self.current_line()).len());
        self.undo.flush();
        self.kill_ring.break_chain();
        self.last_yank = None;
    }

    fn move_down(&mut self) {
        if self.cursor_line + 1 >= self.lines.len() {
            if let Some(entry) = self.history.next() {
                self.set_text(&entry);
            }
            self.break_chains();
            return;
        }
        let desired = *self.desired_col.get_or_insert(self.cursor_col);
        self.cursor_line += 1;
        self.cursor_col = desired.min(graphemes(self.current_line()).len());
        self.undo.flush();
        self.kill_ring.break_chain();
        self.last_yank = None;
    }

    fn move_word_left(&mut self) {
        if self.cursor_col == 0 {
            self.move_left();
            return;
        }
        let clusters = graphemes(self.current_line());
        self.cursor_col = prev_word_boundary(&clusters, self.cursor_col);
        self.after_motion();
    }

    fn move_word_right(&mut self) {
        let clusters = graphemes(self.current_line());
        if self.cursor_col >= clusters.len() {
            self.move_right();
            return;
        }
        self.cursor_col = next_word_boundary(&clusters, self.cursor_col);
        self.after_motion();
    }

    fn move_line_start(&mut self) {
        self.cursor_col = 0;
        self.after_motion();
    }

    fn move_line_end(&mut self) {
        self.cursor_col = graphemes(self.current_line()).len();
        self.after_motion();
    }

    /// Submit the buffer: push to history, clear, invoke the callback.
    pub fn submit(&mut self) {
        let text = self.text();
        self.history.push(text.clone());
        self.lines = vec![String::new()];
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.undo = SnapshotUndo::new(UNDO_DEPTH);
        self.break_chains();
        self.autocomplete.close();
        if let Some(callback) = self.on_submit.as_mut() {
            callback(text);
        }
    }

    fn after_edit(&mut self) {
        self.desired_col = None;
        self.kill_ring.break_chain();
        self.last_yank = None;
        self.autocomplete.close();
    }

    fn after_kill(&mut self) {
        self.desired_col = None;
        self.last_yank = None;
        self.autocomplete.close();
    }

    fn after_motion(&mut self) {
        self.desired_col = None;
        self.break_chains();
    }

    fn break_chains(&mut self) {
        self.undo.flush();
        self.kill_ring.break_chain();
        self.last_yank = None;
    }

    fn trigger_autocomplete(&mut self) {
        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let suggestions = provider.complete(self.current_line(), self.cursor_col);
        match suggestions.len() {
            0 => {}
            1 => self.accept_suggestion(suggestions[0].clone()),
            _ => self.autocomplete.open(suggestions),
        }
    }

    fn accept_suggestion(&mut self, suggestion: Suggestion) {
        self.undo.record(self.snapshot(), false);
        let start = Self::byte_at(self.current_line(), suggestion.replace_from);
        let end = Self::byte_at(self.current_line(), self.cursor_col);
        self.lines[self.cursor_line].replace_range(start..end, &suggestion.text);
        self.cursor_col = suggestion.replace_from + graphemes(&suggestion.text).len();
        self.after_edit();
    }

    fn apply_action(&mut self, action: EditorAction) {
        match action {
            EditorAction::MoveLeft => self.move_left(),
            EditorAction::MoveRight => self.move_right(),
            EditorAction::MoveUp => self.move_up(),
            EditorAction::MoveDown => self.move_down(),
            EditorAction::MoveWordLeft => self.move_word_left(),
            EditorAction::MoveWordRight => self.move_word_right(),
            EditorAction::MoveLineStart => self.move_line_start(),
            EditorAction::MoveLineEnd => self.move_line_end(),
            EditorAction::DeleteBackward => self.delete_backward(),
            EditorAction::DeleteForward => self.delete_forward(),
            EditorAction::DeleteWordBackward => self.delete_word_backward(),
            EditorAction::DeleteWordForward => self.delete_word_forward(),
            EditorAction::KillToLineEnd => self.kill_to_line_end(),
            EditorAction::KillToLineStart => self.kill_to_line_start(),
            EditorAction::Yank => self.yank(),
            EditorAction::YankPop => self.yank_pop(),
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::InsertNewline => self.insert_newline(),
            EditorAction::Submit => self.submit(),
        }
    }

    /// Menu-mode key handling. Returns true when the key was consumed.
    fn handle_menu_key(&mut self, key: &crate::input::KeyId) -> bool {
        if !self.autocomplete.is_open() {
            return false;
        }
        if key.is("down") || key.is("ctrl+n") || key.is("tab") {
            self.autocomplete.select_next();
            return true;
        }
        if key.is("up") || key.is("ctrl+p") {
            self.autocomplete.select_previous();
            return true;
        }
        if key.is("enter") {
            if let Some(suggestion) = self.autocomplete.current().cloned() {
                self.accept_suggestion(suggestion);
            }
            return true;
        }
        if key.is("escape") {
            self.autocomplete.close();
            return true;
        }
        // Any other key closes the menu and is handled normally.
        self.autocomplete.close();
        false
    }
}

impl Component for Editor {
    fn render(&mut self, width: usize) -> Vec<String> {
        let width = width.max(1);
        let mut out = Vec::new();
        for (line_index, line) in self.lines.iter().enumerate() {
            let cursor_here = self.focused && line_index == self.cursor_line;
            let clusters = graphemes(line);
            let mut chunk = String::new();
            let mut chunk_width = 0usize;
            for (i, g) in clusters.iter().enumerate() {
                let gw = grapheme_width(g);
                if chunk_width + gw > width && !chunk.is_empty() {
                    out.push(std::mem::take(&mut chunk));
                    chunk_width = 0;
                }
                if cursor_here && i == self.cursor_col {
                    chunk.push_str(CURSOR_MARKER);
                }
                chunk.push_str(g);
                chunk_width += gw;
            }
            if cursor_here && self.cursor_col >= clusters.len() {
                chunk.push_str(CURSOR_MARKER);
            }
            out.push(chunk);
        }
        if self.autocomplete.is_open() {
            let (entries, selected) = self.autocomplete.entries();
            for (i, suggestion) in entries.iter().enumerate().take(MENU_ROWS) {
                let prefix = if i == selected { "▸ " } else { "  " };
                out.push(truncate(
                    &format!("{prefix}{}", suggestion.text),
                    width,
                    "…",
                ));
            }
        }
        out
    }

    fn handle_input(&mut self, data: &str) {
        if let Some(event) = parse_key(data) {
            if event.kind == KeyEventKind::Release {
                return;
            }
            if self.handle_menu_key(&event.id) {
                return;
            }
            if event.id.is("tab") && self.provider.is_some() {
                self.trigger_autocomplete();
                return;
            }
            if let Some(action) = lookup_editor_action(&event.id) {
                self.apply_action(action);
                return;
            }
            if let Some(text) = printable_text(data) {
                self.insert_text(&text);
            }
            return;
        }
        if let Some(text) = printable_text(data) {
            self.insert_text(&text);
            return;
        }
        // Multi-character plain payloads are paste content.
        if !data.starts_with('\x1b') && !data.is_empty() {
            self.insert_text(data);
        }
    }

    fn focusable(&self) -> bool {
        true
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> Editor {
        let mut editor = Editor::new();
        editor.set_text(text);
        editor
    }

    fn press(editor: &mut Editor, data: &str) {
        editor.handle_input(data);
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut editor = Editor::new();
        press(&mut editor, "h");
        press(&mut editor, "i");
        assert_eq!(editor.text(), "hi");
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn grapheme_aware_cursor_motion() {
        let mut editor = editor_with("a你b");
        assert_eq!(editor.cursor(), (0, 3));
        press(&mut editor, "\x1b[D");
        press(&mut editor, "\x1b[D");
        assert_eq!(editor.cursor(), (0, 1));
        editor.delete_forward();
        assert_eq!(editor.text(), "ab");
    }

    #[test]
    fn newline_splits_line() {
        let mut editor = editor_with("abcd");
        press(&mut editor, "\x1b[D");
        press(&mut editor, "\x1b[D");
        editor.insert_newline();
        assert_eq!(editor.text(), "ab\ncd");
        assert_eq!(editor.cursor(), (1, 0));
    }

    #[test]
    fn backspace_joins_lines() {
        let mut editor = editor_with("ab\ncd");
        editor.cursor_line = 1;
        editor.cursor_col = 0;
        editor.delete_backward();
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn word_kill_backward_accumulates() {
        let mut editor = editor_with("one two three");
        editor.delete_word_backward();
        assert_eq!(editor.text(), "one two ");
        editor.delete_word_backward();
        assert_eq!(editor.text(), "one ");
        // Two backward kills merged into one ring entry.
        editor.yank();
        assert_eq!(editor.text(), "one two three");
    }

    #[test]
    fn kill_line_and_yank() {
        let mut editor = editor_with("hello world");
        editor.cursor_col = 5;
        editor.kill_to_line_end();
        assert_eq!(editor.text(), "hello");
        editor.move_line_start();
        editor.yank();
        assert_eq!(editor.text(), " worldhello");
    }

    #[test]
    fn kill_at_line_end_kills_newline() {
        let mut editor = editor_with("ab\ncd");
        editor.cursor_line = 0;
        editor.cursor_col = 2;
        editor.kill_to_line_end();
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn yank_pop_cycles_ring() {
        let mut editor = editor_with("");
        editor.kill_ring.push("first".into(), false, false);
        editor.kill_ring.push("second".into(), false, false);
        editor.yank();
        assert_eq!(editor.text(), "second");
        editor.yank_pop();
        assert_eq!(editor.text(), "first");
    }

    #[test]
    fn yank_pop_requires_preceding_yank() {
        let mut editor = editor_with("stay");
        editor.kill_ring.push("x".into(), false, false);
        editor.yank_pop();
        assert_eq!(editor.text(), "stay");
    }

    #[test]
    fn undo_coalesces_word() {
        let mut editor = Editor::new();
        for c in ["w", "o", "r", "d"] {
            press(&mut editor, c);
        }
        assert_eq!(editor.text(), "word");
        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn space_separates_undo_groups() {
        let mut editor = Editor::new();
        for c in ["a", "b", " ", "c", "d"] {
            press(&mut editor, c);
        }
        assert_eq!(editor.text(), "ab cd");
        editor.undo();
        assert_eq!(editor.text(), "ab ");
        editor.undo();
        assert_eq!(editor.text(), "ab");
        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn undo_underflow_is_benign() {
        let mut editor = Editor::new();
        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn sticky_column_on_vertical_motion() {
        let mut editor = editor_with("longer line\nab\nanother long");
        editor.cursor_line = 0;
        editor.cursor_col = 8;
        editor.move_down();
        assert_eq!(editor.cursor(), (1, 2));
        editor.move_down();
        assert_eq!(editor.cursor(), (2, 8));
    }

    #[test]
    fn history_navigation_at_edges() {
        let mut editor = Editor::new();
        editor.history_mut().push("older".into());
        editor.history_mut().push("newer".into());
        press(&mut editor, "\x1b[A");
        assert_eq!(editor.text(), "newer");
        press(&mut editor, "\x1b[A");
        assert_eq!(editor.text(), "older");
        press(&mut editor, "\x1b[B");
        assert_eq!(editor.text(), "newer");
        press(&mut editor, "\x1b[B");
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn submit_pushes_history_and_clears() {
        let mut editor = Editor::new();
        editor.set_text("hello");
        press(&mut editor, "\r");
        assert_eq!(editor.text(), "");
        press(&mut editor, "\x1b[A");
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn submit_invokes_callback() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let submitted = Rc::new(RefCell::new(None));
        let sink = submitted.clone();
        let mut editor = Editor::new();
        editor.on_submit(move |text| {
            *sink.borrow_mut() = Some(text);
        });
        editor.set_text("message");
        press(&mut editor, "\r");
        assert_eq!(submitted.borrow().as_deref(), Some("message"));
    }

    #[test]
    fn paste_payload_inserted_verbatim() {
        let mut editor = Editor::new();
        editor.handle_input("line1\nline2");
        assert_eq!(editor.text(), "line1\nline2");
        assert_eq!(editor.cursor(), (1, 5));
    }

    #[test]
    fn jump_to_char_moves_or_stays() {
        let mut editor = editor_with("abcabc");
        editor.cursor_col = 0;
        editor.jump_to_char('c');
        assert_eq!(editor.cursor(), (0, 2));
        editor.jump_to_char('z');
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn cursor_marker_emitted_when_focused() {
        let mut editor = editor_with("abc");
        editor.set_focused(true);
        let lines = editor.render(10);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(CURSOR_MARKER));
        assert!(lines[0].ends_with(CURSOR_MARKER));
    }

    #[test]
    fn no_marker_when_unfocused() {
        let mut editor = editor_with("abc");
        let lines = editor.render(10);
        assert!(!lines[0].contains(CURSOR_MARKER));
    }

    #[test]
    fn render_hard_wraps_to_width() {
        let mut editor = editor_with("abcdefghij");
        let lines = editor.render(4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn autocomplete_menu_flow() {
        let mut editor = Editor::new();
        editor.set_completion_provider(Box::new(WordListProvider::new(vec![
            "apple".into(),
            "apricot".into(),
        ])));
        editor.set_text("ap");
        press(&mut editor, "\t");
        // Two candidates: menu opens.
        assert!(editor.autocomplete.is_open());
        press(&mut editor, "\t");
        press(&mut editor, "\r");
        assert_eq!(editor.text(), "apricot");
        assert!(!editor.autocomplete.is_open());
    }

    #[test]
    fn single_candidate_applies_directly() {
        let mut editor = Editor::new();
        editor.set_completion_provider(Box::new(WordListProvider::new(vec!["banana".into()])));
        editor.set_text("ban");
        press(&mut editor, "\t");
        assert_eq!(editor.text(), "banana");
    }

    #[test]
    fn escape_closes_menu() {
        let mut editor = Editor::new();
        editor.set_completion_provider(Box::new(WordListProvider::new(vec![
            "apple".into(),
            "apricot".into(),
        ])));
        editor.set_text("ap");
        press(&mut editor, "\t");
        assert!(editor.autocomplete.is_open());
        press(&mut editor, "\x1b");
        assert!(!editor.autocomplete.is_open());
        assert_eq!(editor.text(), "ap");
    }

    #[test]
    fn release_events_ignored() {
        let mut editor = Editor::new();
        press(&mut editor, "\x1b[97;1u");
        press(&mut editor, "\x1b[98;1:3u");
        assert_eq!(editor.text(), "a");
    }
}
