//! Terminal backends: the seam between the engine and a real TTY.

use std::io::{self, Write};

use crate::error::Result;

/// Low-level terminal I/O.
///
/// The engine funnels every write through one backend instance; there
/// is no other writer to the underlying stream.
pub trait Backend {
    /// Write raw bytes.
    fn write(&mut self, data: &[u8]) -> Result<()>;
    /// Flush buffered output.
    fn flush(&mut self) -> Result<()>;
    /// Current size as `(columns, rows)`.
    fn size(&self) -> Result<(u16, u16)>;
    /// Enter raw mode. On Windows this also enables VT input so
    /// modifier keys arrive as escape sequences.
    fn enter_raw_mode(&mut self) -> Result<()>;
    /// Restore the previous mode.
    fn exit_raw_mode(&mut self) -> Result<()>;
}

/// Real terminal backend over stdout via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermBackend {
    raw_mode: bool,
}

impl CrosstermBackend {
    /// Create a backend; raw mode is not entered until
    /// [`enter_raw_mode`](Backend::enter_raw_mode).
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for CrosstermBackend {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        io::stdout().write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok((cols, rows))
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        if !self.raw_mode {
            crossterm::terminal::enable_raw_mode()?;
            self.raw_mode = true;
        }
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        if self.raw_mode {
            crossterm::terminal::disable_raw_mode()?;
            self.raw_mode = false;
        }
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = crossterm::terminal::disable_raw_mode();
        }
    }
}

/// Capturing backend for tests: records written bytes and reports a
/// fixed size.
#[derive(Debug)]
pub struct TestBackend {
    written: Vec<u8>,
    size: (u16, u16),
    raw_mode: bool,
}

impl TestBackend {
    /// Create a capture backend with a fixed size.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            written: Vec::new(),
            size: (cols, rows),
            raw_mode: false,
        }
    }

    /// Everything written so far.
    pub fn output(&self) -> &[u8] {
        &self.written
    }

    /// Everything written so far, lossily decoded.
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Forget captured output.
    pub fn clear_output(&mut self) {
        self.written.clear();
    }

    /// Change the reported size (simulates a resize).
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }

    /// Whether raw mode is currently entered.
    pub fn raw_mode(&self) -> bool {
        self.raw_mode
    }
}

impl Backend for TestBackend {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(self.size)
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = true;
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_captures_writes() {
        let mut backend = TestBackend::new(80, 24);
        match backend.write(b"abc") {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }
        assert_eq!(backend.output(), b"abc");
        assert_eq!(backend.output_str(), "abc");
    }

    #[test]
    fn test_backend_reports_size() {
        let backend = TestBackend::new(100, 30);
        match backend.size() {
            Ok(size) => assert_eq!(size, (100, 30)),
            Err(_) => unreachable!(),
        }
    }

    #[test]
    fn test_backend_tracks_raw_mode() {
        let mut backend = TestBackend::new(80, 24);
        let _ = backend.enter_raw_mode();
        assert!(backend.raw_mode());
        let _ = backend.exit_raw_mode();
        assert!(!backend.raw_mode());
    }
}
