//! Editor keybindings and the process-wide keybindings manager.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::input::KeyId;

/// Editing actions an editor keystroke can map to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorAction {
    /// Move one grapheme left.
    MoveLeft,
    /// Move one grapheme right.
    MoveRight,
    /// Move up one line (or into history at the top).
    MoveUp,
    /// Move down one line (or into history at the bottom).
    MoveDown,
    /// Move one word left.
    MoveWordLeft,
    /// Move one word right.
    MoveWordRight,
    /// Move to the start of the line.
    MoveLineStart,
    /// Move to the end of the line.
    MoveLineEnd,
    /// Delete the grapheme before the cursor.
    DeleteBackward,
    /// Delete the grapheme under the cursor.
    DeleteForward,
    /// Kill the word before the cursor into the kill ring.
    DeleteWordBackward,
    /// Kill the word after the cursor into the kill ring.
    DeleteWordForward,
    /// Kill to the end of the line.
    KillToLineEnd,
    /// Kill to the start of the line.
    KillToLineStart,
    /// Insert the most recent kill.
    Yank,
    /// Replace the last yank with the next ring entry.
    YankPop,
    /// Undo the last edit group.
    Undo,
    /// Redo the last undone edit.
    Redo,
    /// Insert a newline without submitting.
    InsertNewline,
    /// Submit the buffer.
    Submit,
}

/// A `KeyId` to action map.
#[derive(Clone, Debug)]
pub struct EditorKeybindings {
    map: HashMap<KeyId, EditorAction>,
}

impl EditorKeybindings {
    /// An empty map.
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a key spelling (e.g. `"ctrl+k"`) to an action. Invalid
    /// spellings are ignored.
    pub fn bind(&mut self, key: &str, action: EditorAction) {
        if let Some(id) = KeyId::parse(key) {
            self.map.insert(id, action);
        }
    }

    /// Look up the action for a key.
    pub fn lookup(&self, key: &KeyId) -> Option<EditorAction> {
        self.map.get(key).copied()
    }
}

impl Default for EditorKeybindings {
    /// Emacs-flavored defaults.
    fn default() -> Self {
        let mut bindings = Self::empty();
        for (key, action) in [
            ("left", EditorAction::MoveLeft),
            ("ctrl+b", EditorAction::MoveLeft),
            ("right", EditorAction::MoveRight),
            ("ctrl+f", EditorAction::MoveRight),
            ("up", EditorAction::MoveUp),
            ("down", EditorAction::MoveDown),
            ("alt+b", EditorAction::MoveWordLeft),
            ("ctrl+left", EditorAction::MoveWordLeft),
            ("alt+f", EditorAction::MoveWordRight),
            ("ctrl+right", EditorAction::MoveWordRight),
            ("home", EditorAction::MoveLineStart),
            ("ctrl+a", EditorAction::MoveLineStart),
            ("end", EditorAction::MoveLineEnd),
            ("ctrl+e", EditorAction::MoveLineEnd),
            ("backspace", EditorAction::DeleteBackward),
            ("delete", EditorAction::DeleteForward),
            ("ctrl+d", EditorAction::DeleteForward),
            ("ctrl+w", EditorAction::DeleteWordBackward),
            ("alt+backspace", EditorAction::DeleteWordBackward),
            ("alt+d", EditorAction::DeleteWordForward),
            ("ctrl+k", EditorAction::KillToLineEnd),
            ("ctrl+u", EditorAction::KillToLineStart),
            ("ctrl+y", EditorAction::Yank),
            ("alt+y", EditorAction::YankPop),
            ("ctrl+_", EditorAction::Undo),
            ("ctrl+z", EditorAction::Undo),
            ("alt+z", EditorAction::Redo),
            ("shift+enter", EditorAction::InsertNewline),
            ("alt+enter", EditorAction::InsertNewline),
            ("enter", EditorAction::Submit),
        ] {
            bindings.bind(key, action);
        }
        bindings
    }
}

/// Installed keybindings; lazily populated with the defaults. The
/// mutex satisfies `Sync` for the static — all access happens on the
/// event thread.
static KEYBINDINGS: Mutex<Option<EditorKeybindings>> = Mutex::new(None);

/// Replace the process-wide editor keybindings.
pub fn set_editor_keybindings(bindings: EditorKeybindings) {
    let mut guard = KEYBINDINGS.lock().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(bindings);
}

/// Look up an action in the installed keybindings, installing the
/// defaults on first use.
pub fn lookup_editor_action(key: &KeyId) -> Option<EditorAction> {
    let mut guard = KEYBINDINGS.lock().unwrap_or_else(PoisonError::into_inner);
    guard.get_or_insert_with(EditorKeybindings::default).lookup(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> KeyId {
        match KeyId::parse(s) {
            Some(k) => k,
            None => unreachable!("invalid key {s:?}"),
        }
    }

    #[test]
    fn defaults_cover_core_motions() {
        let bindings = EditorKeybindings::default();
        assert_eq!(bindings.lookup(&key("ctrl+a")), Some(EditorAction::MoveLineStart));
        assert_eq!(bindings.lookup(&key("alt+f")), Some(EditorAction::MoveWordRight));
        assert_eq!(bindings.lookup(&key("ctrl+k")), Some(EditorAction::KillToLineEnd));
        assert_eq!(bindings.lookup(&key("enter")), Some(EditorAction::Submit));
        assert!(bindings.lookup(&key("ctrl+q")).is_none());
    }

    #[test]
    fn bind_rejects_invalid_spellings() {
        let mut bindings = EditorKeybindings::empty();
        bindings.bind("not a key", EditorAction::Undo);
        bindings.bind("ctrl+x", EditorAction::Undo);
        assert_eq!(bindings.lookup(&key("ctrl+x")), Some(EditorAction::Undo));
    }

    #[test]
    fn global_manager_is_replaceable() {
        // Lazily installs defaults.
        assert_eq!(
            lookup_editor_action(&key("ctrl+y")),
            Some(EditorAction::Yank)
        );
        let mut custom = EditorKeybindings::default();
        custom.bind("ctrl+t", EditorAction::Undo);
        set_editor_keybindings(custom);
        assert_eq!(lookup_editor_action(&key("ctrl+t")), Some(EditorAction::Undo));
        // Restore defaults for other tests.
        set_editor_keybindings(EditorKeybindings::default());
    }
}
