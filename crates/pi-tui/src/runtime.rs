//! The event loop.
//!
//! Single-threaded cooperative scheduling: one reader thread moves raw
//! stdin bytes over a channel, and everything else — segmentation, key
//! dispatch, state mutation, the coalesced draw — happens here on the
//! event thread. Suspension points are exactly two: waiting for input
//! (with the stdin buffer's 10 ms incomplete-prefix deadline) and the
//! tick that performs the coalesced draw.

use std::io::Read;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::input::{INCOMPLETE_FLUSH_TIMEOUT, StdinBuffer, StdinEvent};
use crate::terminal::Backend;
use crate::tui::Tui;

/// How often the terminal size is polled when otherwise idle.
const RESIZE_POLL: Duration = Duration::from_millis(100);

/// Drives a [`Tui`] from raw stdin bytes.
pub struct EventLoop {
    rx: Receiver<Vec<u8>>,
    buffer: StdinBuffer,
    /// Deadline for flushing a dangling incomplete prefix.
    flush_at: Option<Instant>,
}

impl EventLoop {
    /// Create an event loop fed by a stdin reader thread.
    pub fn new() -> Self {
        let (tx, rx) = channel();
        thread::spawn(move || read_stdin(tx));
        Self::from_receiver(rx)
    }

    /// Create an event loop over an explicit byte channel (tests,
    /// alternative input sources).
    pub fn from_receiver(rx: Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            buffer: StdinBuffer::new(),
            flush_at: None,
        }
    }

    /// Run until `should_exit` returns true or stdin closes.
    ///
    /// Input batches are dispatched in arrival order; a draw happens
    /// only on the tick after the batch that requested it. Resizes are
    /// detected by polling the backend size and schedule a render
    /// rather than drawing synchronously.
    pub fn run<B: Backend>(
        &mut self,
        tui: &mut Tui<B>,
        mut should_exit: impl FnMut(&Tui<B>) -> bool,
    ) -> Result<()> {
        let mut last_size = backend_size(tui);
        loop {
            let timeout = self.next_timeout(tui);
            match self.rx.recv_timeout(timeout) {
                Ok(bytes) => {
                    self.dispatch_bytes(tui, &bytes);
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.flush_if_due(tui);
                    let size = backend_size(tui);
                    if size != last_size {
                        last_size = size;
                        tui.handle_resize();
                    }
                    tui.tick()?;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tui.tick()?;
                    return Ok(());
                }
            }
            if should_exit(tui) {
                return Ok(());
            }
        }
    }

    /// Feed one chunk of raw bytes through the stdin buffer into the
    /// engine.
    pub fn dispatch_bytes<B: Backend>(&mut self, tui: &mut Tui<B>, bytes: &[u8]) {
        for event in self.buffer.push(bytes) {
            dispatch_event(tui, event);
        }
        self.flush_at = self
            .buffer
            .has_incomplete()
            .then(|| Instant::now() + INCOMPLETE_FLUSH_TIMEOUT);
    }

    fn flush_if_due<B: Backend>(&mut self, tui: &mut Tui<B>) {
        let due = self.flush_at.is_some_and(|at| Instant::now() >= at);
        if due {
            self.flush_at = None;
            if let Some(event) = self.buffer.flush() {
                dispatch_event(tui, event);
            }
        }
    }

    fn next_timeout<B: Backend>(&self, tui: &Tui<B>) -> Duration {
        if tui.render_pending() {
            // Drain whatever is already queued, then tick immediately.
            return Duration::ZERO;
        }
        if let Some(at) = self.flush_at {
            return at.saturating_duration_since(Instant::now());
        }
        RESIZE_POLL
    }

    /// Read and discard input until `max` elapses or `idle` passes in
    /// silence. Kitty flags are popped first so the terminal stops
    /// reporting key releases; required before exit on slow links.
    pub fn drain_input<B: Backend>(
        &mut self,
        tui: &mut Tui<B>,
        max: Duration,
        idle: Duration,
    ) -> Result<()> {
        tui.terminal_mut().pop_kitty_flags()?;
        let deadline = Instant::now() + max;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let timeout = idle.min(deadline - now);
            match self.rx.recv_timeout(timeout) {
                Ok(_discarded) => {}
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(());
                }
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch_event<B: Backend>(tui: &mut Tui<B>, event: StdinEvent) {
    match event {
        StdinEvent::Data(data) => tui.handle_input(&data),
        StdinEvent::Paste(content) => tui.handle_paste(&content),
    }
}

fn backend_size<B: Backend>(tui: &Tui<B>) -> (usize, usize) {
    (tui.terminal().columns(), tui.terminal().rows())
}

fn read_stdin(tx: Sender<Vec<u8>>) {
    let mut stdin = std::io::stdin();
    let mut buf = [0u8; 1024];
    loop {
        match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, component};
    use crate::debug::DebugConfig;
    use crate::terminal::{Terminal, TestBackend};

    struct Recorder {
        inputs: Vec<String>,
        focused: bool,
    }

    impl Component for Recorder {
        fn render(&mut self, _width: usize) -> Vec<String> {
            vec!["r".to_string()]
        }

        fn handle_input(&mut self, data: &str) {
            self.inputs.push(data.to_string());
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

    fn engine_with_recorder() -> (
        Tui<TestBackend>,
        std::rc::Rc<std::cell::RefCell<Recorder>>,
    ) {
        let mut tui = Tui::with_config(
            Terminal::new(TestBackend::new(40, 10)),
            DebugConfig::default(),
        );
        let recorder = component(Recorder {
            inputs: Vec::new(),
            focused: false,
        });
        let handle: crate::component::ComponentHandle = recorder.clone();
        tui.add_child(handle.clone());
        tui.set_focus(Some(&handle));
        (tui, recorder)
    }

    #[test]
    fn bytes_flow_through_to_component() {
        let (mut tui, recorder) = engine_with_recorder();
        let (tx, rx) = channel();
        let mut event_loop = EventLoop::from_receiver(rx);
        drop(tx);
        event_loop.dispatch_bytes(&mut tui, b"hi\x1b[A");
        assert_eq!(
            recorder.borrow().inputs,
            vec!["h".to_string(), "i".to_string(), "\x1b[A".to_string()]
        );
    }

    #[test]
    fn paste_routed_to_focused_component() {
        let (mut tui, recorder) = engine_with_recorder();
        let (tx, rx) = channel();
        let mut event_loop = EventLoop::from_receiver(rx);
        drop(tx);
        event_loop.dispatch_bytes(&mut tui, b"\x1b[200~two\nlines\x1b[201~");
        assert_eq!(recorder.borrow().inputs, vec!["two\nlines".to_string()]);
    }

    #[test]
    fn run_exits_when_channel_closes() {
        let (mut tui, recorder) = engine_with_recorder();
        let (tx, rx) = channel();
        let mut event_loop = EventLoop::from_receiver(rx);
        match tx.send(b"x".to_vec()) {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        drop(tx);
        match event_loop.run(&mut tui, |_| false) {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        assert_eq!(recorder.borrow().inputs, vec!["x".to_string()]);
    }

    #[test]
    fn run_honors_exit_predicate() {
        let (mut tui, _recorder) = engine_with_recorder();
        let (tx, rx) = channel();
        let mut event_loop = EventLoop::from_receiver(rx);
        match tx.send(b"q".to_vec()) {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        // The sender stays open; the predicate must stop the loop.
        match event_loop.run(&mut tui, |_| true) {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
    }

    #[test]
    fn incomplete_prefix_flushes_after_timeout() {
        let (mut tui, recorder) = engine_with_recorder();
        let (tx, rx) = channel();
        let mut event_loop = EventLoop::from_receiver(rx);
        drop(tx);
        event_loop.dispatch_bytes(&mut tui, b"\x1b");
        assert!(recorder.borrow().inputs.is_empty());
        std::thread::sleep(INCOMPLETE_FLUSH_TIMEOUT + Duration::from_millis(2));
        event_loop.flush_if_due(&mut tui);
        assert_eq!(recorder.borrow().inputs, vec!["\x1b".to_string()]);
    }

    #[test]
    fn drain_discards_input() {
        let (mut tui, recorder) = engine_with_recorder();
        let (tx, rx) = channel();
        let mut event_loop = EventLoop::from_receiver(rx);
        match tx.send(b"late release".to_vec()) {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        drop(tx);
        match event_loop.drain_input(&mut tui, Duration::from_millis(50), Duration::from_millis(5))
        {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        assert!(recorder.borrow().inputs.is_empty());
    }
}
