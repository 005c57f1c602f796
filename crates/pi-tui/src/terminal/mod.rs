//! Terminal adapter: raw-mode lifecycle and byte-exact control output.
//!
//! Owns the real terminal handle. Entry enables bracketed paste and
//! queries the Kitty keyboard protocol and the cell pixel size; exit
//! undoes everything it did, including popping pushed Kitty flags so a
//! late key release cannot leak into the parent shell.

mod backend;

pub use backend::{Backend, CrosstermBackend, TestBackend};

use crate::debug;
use crate::error::Result;
use crate::input::set_kitty_protocol_active;

/// Bracketed paste on/off.
const BRACKETED_PASTE_ON: &str = "\x1b[?2004h";
const BRACKETED_PASTE_OFF: &str = "\x1b[?2004l";
/// Query current Kitty keyboard flags; the ack arrives on stdin.
const KITTY_QUERY: &str = "\x1b[?u";
/// Push disambiguate + report-events + report-alternates.
const KITTY_PUSH_FLAGS: &str = "\x1b[>7u";
/// Pop our pushed flags.
const KITTY_POP_FLAGS: &str = "\x1b[<u";
/// Query the cell size in pixels; response is `CSI 6;H;W t`.
const CELL_SIZE_QUERY: &str = "\x1b[16t";
const CURSOR_SHOW: &str = "\x1b[?25h";
const CURSOR_HIDE: &str = "\x1b[?25l";

/// Terminal adapter over a [`Backend`].
///
/// Sole owner of terminal output; all engine writes funnel through
/// [`write`](Self::write). Write failures are fatal to the engine,
/// which calls [`stop`](Self::stop) before propagating them.
pub struct Terminal<B: Backend> {
    backend: B,
    started: bool,
    kitty_flags_pushed: bool,
    cursor_visible: bool,
}

impl<B: Backend> Terminal<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            started: false,
            kitty_flags_pushed: false,
            cursor_visible: true,
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The underlying backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Enter raw mode, enable bracketed paste, and emit the Kitty and
    /// cell-size queries. Their responses arrive on stdin and are
    /// routed back via [`handle_protocol_response`](Self::handle_protocol_response).
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.backend.enter_raw_mode()?;
        self.started = true;
        self.write(BRACKETED_PASTE_ON)?;
        self.write(KITTY_QUERY)?;
        self.write(CELL_SIZE_QUERY)?;
        self.flush()
    }

    /// Undo everything `start` did and show the cursor.
    ///
    /// Continues through individual failures so a broken pipe cannot
    /// leave the terminal in raw mode.
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        let mut first_err = None;
        for op in [
            self.write(BRACKETED_PASTE_OFF),
            self.pop_kitty_flags(),
            self.write(CURSOR_SHOW),
            self.flush(),
        ] {
            if let Err(e) = op {
                first_err.get_or_insert(e);
            }
        }
        self.cursor_visible = true;
        set_kitty_protocol_active(false);
        let raw = self.backend.exit_raw_mode();
        self.started = false;
        match first_err {
            Some(e) => Err(e),
            None => raw,
        }
    }

    /// Handle a protocol response that arrived on stdin. Returns true
    /// when the sequence was consumed (and must not reach components).
    pub fn handle_protocol_response(&mut self, data: &str) -> bool {
        if crate::input::parse_kitty_ack(data).is_some() {
            // The terminal understands the protocol: push our flags.
            set_kitty_protocol_active(true);
            if self.push_kitty_flags().is_err() {
                tracing::warn!("failed to push kitty keyboard flags");
            }
            return true;
        }
        if let Some((height, width)) = crate::images::parse_cell_size_report(data) {
            crate::images::set_cell_size(width, height);
            return true;
        }
        false
    }

    fn push_kitty_flags(&mut self) -> Result<()> {
        if !self.kitty_flags_pushed {
            self.write(KITTY_PUSH_FLAGS)?;
            self.flush()?;
            self.kitty_flags_pushed = true;
        }
        Ok(())
    }

    /// Pop pushed Kitty flags, if any. Safe to call repeatedly; also
    /// used by input draining before exit.
    pub fn pop_kitty_flags(&mut self) -> Result<()> {
        if self.kitty_flags_pushed {
            self.write(KITTY_POP_FLAGS)?;
            self.flush()?;
            self.kitty_flags_pushed = false;
        }
        Ok(())
    }

    /// Write a string to the terminal (and the write log, if enabled).
    pub fn write(&mut self, data: &str) -> Result<()> {
        debug::append_write_log(data);
        self.backend.write(data.as_bytes())
    }

    /// Flush the backend.
    pub fn flush(&mut self) -> Result<()> {
        self.backend.flush()
    }

    /// Current column count.
    pub fn columns(&self) -> usize {
        self.backend.size().map(|(c, _)| c as usize).unwrap_or(80)
    }

    /// Current row count.
    pub fn rows(&self) -> usize {
        self.backend.size().map(|(_, r)| r as usize).unwrap_or(24)
    }

    /// Show the hardware cursor.
    pub fn show_cursor(&mut self) -> Result<()> {
        if !self.cursor_visible {
            self.write(CURSOR_SHOW)?;
            self.cursor_visible = true;
        }
        Ok(())
    }

    /// Hide the hardware cursor.
    pub fn hide_cursor(&mut self) -> Result<()> {
        if self.cursor_visible {
            self.write(CURSOR_HIDE)?;
            self.cursor_visible = false;
        }
        Ok(())
    }

    /// Move the cursor vertically: negative is up, positive is down.
    pub fn move_by(&mut self, lines: isize) -> Result<()> {
        if lines < 0 {
            self.write(&format!("\x1b[{}A", -lines))
        } else if lines > 0 {
            self.write(&format!("\x1b[{}B", lines))
        } else {
            Ok(())
        }
    }

    /// Move to an absolute column (0-based).
    pub fn move_to_column(&mut self, col: usize) -> Result<()> {
        self.write(&format!("\x1b[{}G", col + 1))
    }

    /// Clear the current line.
    pub fn clear_line(&mut self) -> Result<()> {
        self.write("\x1b[2K")
    }

    /// Clear from the cursor to the end of the screen.
    pub fn clear_from_cursor(&mut self) -> Result<()> {
        self.write("\x1b[0J")
    }

    /// Clear the screen and home the cursor.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.write("\x1b[2J\x1b[H")
    }

    /// Clear scrollback, then the screen, then home the cursor.
    pub fn clear_scrollback_and_screen(&mut self) -> Result<()> {
        self.write("\x1b[3J\x1b[2J\x1b[H")
    }

    /// Set the terminal title.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.write(&format!("\x1b]0;{title}\x07"))
    }

    /// Fatal-path restore: best-effort terminal cleanup before an error
    /// propagates to the host.
    pub fn restore_on_fatal(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "terminal restore failed");
        }
    }
}

impl<B: Backend> Drop for Terminal<B> {
    fn drop(&mut self) {
        if self.started {
            let _ = self.stop();
        }
    }
}

/// Convenience constructor for the real terminal.
pub fn stdout_terminal() -> Terminal<CrosstermBackend> {
    Terminal::new(CrosstermBackend::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_emits_entry_sequences() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        match terminal.start() {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        let out = terminal.backend().output_str();
        assert!(out.contains("\x1b[?2004h"));
        assert!(out.contains("\x1b[?u"));
        assert!(out.contains("\x1b[16t"));
        assert!(terminal.backend().raw_mode());
    }

    #[test]
    fn stop_disables_paste_and_restores() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        let _ = terminal.start();
        terminal.backend_mut().clear_output();
        match terminal.stop() {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        let out = terminal.backend().output_str();
        assert!(out.contains("\x1b[?2004l"));
        assert!(out.contains("\x1b[?25h"));
        assert!(!terminal.backend().raw_mode());
    }

    #[test]
    fn kitty_ack_pushes_flags() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        let _ = terminal.start();
        terminal.backend_mut().clear_output();
        assert!(terminal.handle_protocol_response("\x1b[?1u"));
        assert!(terminal.backend().output_str().contains("\x1b[>7u"));
        // Popping emits CSI < u exactly once.
        terminal.backend_mut().clear_output();
        let _ = terminal.pop_kitty_flags();
        let _ = terminal.pop_kitty_flags();
        assert_eq!(terminal.backend().output_str(), "\x1b[<u");
        crate::input::set_kitty_protocol_active(false);
    }

    #[test]
    fn cell_size_report_consumed() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        assert!(terminal.handle_protocol_response("\x1b[6;18;9t"));
        assert!(!terminal.handle_protocol_response("\x1b[A"));
    }

    #[test]
    fn move_by_emits_relative_moves() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        let _ = terminal.move_by(-3);
        let _ = terminal.move_by(2);
        let _ = terminal.move_by(0);
        assert_eq!(terminal.backend().output_str(), "\x1b[3A\x1b[2B");
    }

    #[test]
    fn column_moves_are_one_based() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        let _ = terminal.move_to_column(0);
        let _ = terminal.move_to_column(9);
        assert_eq!(terminal.backend().output_str(), "\x1b[1G\x1b[10G");
    }

    #[test]
    fn title_uses_osc_zero() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24));
        let _ = terminal.set_title("pi");
        assert_eq!(terminal.backend().output_str(), "\x1b]0;pi\x07");
    }
}
