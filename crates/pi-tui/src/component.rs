//! The component contract and basic containers.
//!
//! A component renders to a list of opaque line strings (which may
//! contain SGR, OSC 8, and APC sequences) and optionally receives raw
//! input while focused. The tree owns components through shared
//! handles; focus references are weak so they never extend a
//! component's lifetime.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::text::{visible_width, wrap};

/// Zero-width marker a focused component embeds at the grapheme where
/// the hardware cursor should be parked (IME candidate positioning).
/// At most one per frame.
pub const CURSOR_MARKER: &str = "\x1b_pi:c\x07";

/// A renderable UI element.
///
/// `render` must produce lines whose visible width does not exceed the
/// requested width; the engine treats a violation as fatal.
pub trait Component {
    /// Render to lines at the given width. No line may contain `\n`.
    fn render(&mut self, width: usize) -> Vec<String>;

    /// Drop any internal render cache.
    fn invalidate(&mut self) {}

    /// Receive one raw input sequence while focused.
    fn handle_input(&mut self, data: &str) {
        let _ = data;
    }

    /// Whether this component can take focus.
    fn focusable(&self) -> bool {
        false
    }

    /// Focus flag, set by the engine only.
    fn set_focused(&mut self, focused: bool) {
        let _ = focused;
    }

    /// Current focus flag.
    fn is_focused(&self) -> bool {
        false
    }

    /// Opt in to receiving key release events. Defaults to off; the
    /// engine drops release sequences for components that do not ask.
    fn wants_key_release(&self) -> bool {
        false
    }
}

/// Owning handle to a component in the tree.
pub type ComponentHandle = Rc<RefCell<dyn Component>>;

/// Non-owning reference, used for focus bookkeeping.
pub type ComponentRef = Weak<RefCell<dyn Component>>;

/// Wrap a component into a shared handle.
pub fn component<C: Component + 'static>(inner: C) -> Rc<RefCell<C>> {
    Rc::new(RefCell::new(inner))
}

/// Composes children by concatenating their rendered lines.
#[derive(Default)]
pub struct Container {
    children: Vec<ComponentHandle>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child.
    pub fn add_child(&mut self, child: ComponentHandle) {
        self.children.push(child);
    }

    /// Remove a child by handle identity.
    pub fn remove_child(&mut self, child: &ComponentHandle) {
        self.children.retain(|c| !Rc::ptr_eq(c, child));
    }

    /// Remove all children.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True when the container has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The children, in render order.
    pub fn children(&self) -> &[ComponentHandle] {
        &self.children
    }
}

impl Component for Container {
    fn render(&mut self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for child in &self.children {
            lines.extend(child.borrow_mut().render(width));
        }
        lines
    }

    fn invalidate(&mut self) {
        for child in &self.children {
            child.borrow_mut().invalidate();
        }
    }
}

/// Static word-wrapped text with a per-width render cache.
pub struct Text {
    content: String,
    cache: Option<(usize, Vec<String>)>,
}

impl Text {
    /// Create a text component.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            cache: None,
        }
    }

    /// Replace the content.
    pub fn set_text(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cache = None;
    }

    /// The current content.
    pub fn text(&self) -> &str {
        &self.content
    }
}

impl Component for Text {
    fn render(&mut self, width: usize) -> Vec<String> {
        if let Some((cached_width, lines)) = &self.cache {
            if *cached_width == width {
                return lines.clone();
            }
        }
        let lines = wrap(&self.content, width);
        debug_assert!(lines.iter().all(|l| visible_width(l) <= width));
        self.cache = Some((width, lines.clone()));
        lines
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }
}
