//! Cancellable loading indicator.
//!
//! A braille spinner with an optional message. Pressing `Esc` while it
//! has focus trips the abort token and invokes the abort callback.
//! Cancellation is cooperative: the token is observable, never
//! enforced — whoever started the work polls it.

use std::cell::Cell;
use std::rc::Rc;

use crate::component::Component;
use crate::input::parse_key;
use crate::text::truncate;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Observable cancellation flag shared with the work being awaited.
#[derive(Clone, Debug, Default)]
pub struct AbortToken(Rc<Cell<bool>>);

impl AbortToken {
    /// Whether abort was requested.
    pub fn is_aborted(&self) -> bool {
        self.0.get()
    }

    /// Request abort.
    pub fn abort(&self) {
        self.0.set(true);
    }
}

/// Spinner component that can be cancelled with `Esc`.
pub struct Loader {
    message: String,
    frame: usize,
    token: AbortToken,
    on_abort: Option<Box<dyn FnMut()>>,
    focused: bool,
}

impl Loader {
    /// Create a loader with a message shown after the spinner.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frame: 0,
            token: AbortToken::default(),
            on_abort: None,
            focused: false,
        }
    }

    /// Install the abort callback.
    pub fn on_abort(&mut self, callback: impl FnMut() + 'static) {
        self.on_abort = Some(Box::new(callback));
    }

    /// The loader's abort token.
    pub fn token(&self) -> AbortToken {
        self.token.clone()
    }

    /// Replace the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Advance the spinner animation one frame.
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % FRAMES.len();
    }

    /// Whether `Esc` has been pressed.
    pub fn is_aborted(&self) -> bool {
        self.token.is_aborted()
    }
}

impl Component for Loader {
    fn render(&mut self, width: usize) -> Vec<String> {
        let line = format!("{} {}", FRAMES[self.frame], self.message);
        vec![truncate(&line, width.max(1), "…")]
    }

    fn handle_input(&mut self, data: &str) {
        let is_escape = parse_key(data).is_some_and(|e| e.id.is("escape"));
        if is_escape && !self.token.is_aborted() {
            self.token.abort();
            if let Some(callback) = self.on_abort.as_mut() {
                callback();
            }
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
