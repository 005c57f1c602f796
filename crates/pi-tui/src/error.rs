//! Error types for pi-tui.

use std::io;
use std::path::PathBuf;

/// Error type for pi-tui operations.
#[derive(Debug, thiserror::Error)]
pub enum PiTuiError {
    /// I/O error (terminal writes are fatal once this surfaces).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Terminal operation failed.
    #[error("terminal error: {0}")]
    Terminal(String),

    /// A component rendered a line wider than the terminal.
    ///
    /// The engine restores the terminal and writes a crash dump before
    /// surfacing this; it is never recovered.
    #[error("component rendered {width} columns into a {max} column terminal (crash dump: {dump})")]
    ContractViolation {
        /// Measured visible width of the offending line.
        width: usize,
        /// Terminal width the component was asked to render into.
        max: usize,
        /// Location of the crash dump with all rendered lines.
        dump: PathBuf,
    },

    /// An overlay option could not be parsed (malformed percent string).
    #[error("invalid overlay dimension: {0:?}")]
    InvalidDimension(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for pi-tui operations.
pub type Result<T> = std::result::Result<T, PiTuiError>;
