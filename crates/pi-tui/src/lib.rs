//! pi-tui: a differential-redraw terminal UI engine.
//!
//! Renders a tree of components to a VT-compatible terminal, diffing
//! each frame against the previous one so only changed lines are
//! rewritten, and routes raw keyboard input — including Kitty keyboard
//! protocol events — back to the focused component.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Application Layer                      │
//! │        (components, overlays, editor, loader widgets)       │
//! └─────────────────────────────────────────────────────────────┘
//!         ▲ handle_input                        │ render
//!         │                                     ▼
//! ┌──────────────────────┐      ┌──────────────────────────────┐
//! │  Input pipeline      │      │  Frame pipeline              │
//! │  stdin bytes         │      │  component tree → lines      │
//! │   → StdinBuffer      │      │   → overlay compositor       │
//! │   → key classifier   │      │   → cursor marker / resets   │
//! │   → focused target   │      │   → width contract check     │
//! └──────────────────────┘      └──────────────────────────────┘
//!         ▲                                     │
//!         │                                     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Differential drawer (DiffDrawer)               │
//! │   first/last changed lines → minimal moves + clear-lines    │
//! │   synchronized output · scrollback-preserving scrolling     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Terminal adapter (raw mode, crossterm)           │
//! │  bracketed paste · Kitty protocol negotiation · cell size   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Subsystems
//!
//! - **Stdin buffer**: reassembles escape sequences split across reads
//!   and extracts bracketed paste
//! - **Key classifier**: Kitty CSI-u first, legacy xterm fallback,
//!   canonical [`KeyId`] values
//! - **Text utilities**: grapheme-cluster widths, ANSI-aware wrap /
//!   truncate / slice, SGR tracking
//! - **Render & diff engine**: overlay compositing, cursor-marker
//!   parking for IME, minimal redraw
//! - **Editor**: multi-line editing with kill ring, snapshot undo,
//!   history, and autocomplete
//!
//! Scheduling is single-threaded cooperative: all state lives on the
//! event thread, rendering is coalesced to one draw per tick, and the
//! only other thread is a byte-moving stdin reader.

pub mod component;
pub mod debug;
pub mod editor;
pub mod error;
pub mod images;
pub mod input;
pub mod loader;
pub mod overlay;
pub mod runtime;
pub mod terminal;
pub mod text;
pub mod tui;

mod draw;

pub use component::{CURSOR_MARKER, Component, ComponentHandle, ComponentRef, Container, Text,
    component};
pub use debug::DebugConfig;
pub use editor::{
    CompletionProvider, Editor, EditorAction, EditorKeybindings, History, KillRing,
    Suggestion, WordListProvider, set_editor_keybindings,
};
pub use error::{PiTuiError, Result};
pub use input::{
    KeyEvent, KeyEventKind, KeyId, StdinBuffer, StdinEvent, encode_key, has_release_or_repeat,
    kitty_protocol_active, parse_key, parse_key_with, printable_text,
};
pub use loader::{AbortToken, Loader};
pub use overlay::{Anchor, Dimension, Margin, OverlayOptions};
pub use runtime::EventLoop;
pub use terminal::{Backend, CrosstermBackend, Terminal, TestBackend, stdout_terminal};
pub use text::{
    SgrTracker, extract_segments, slice, truncate, truncate_padded, visible_width, wrap,
};
pub use tui::{OverlayHandle, Tui};
