//! Differential frame drawing.
//!
//! Diffs each composed frame against the previous one and emits the
//! minimum cursor movement and clear-line sequences to update the
//! terminal in place, preserving scrollback. Full redraws (which clear
//! scrollback) are the fallback path, taken only when the width
//! changed, content shrank with no overlays active, or a change landed
//! above the previously visible viewport.

use crate::error::Result;
use crate::terminal::{Backend, Terminal};

const SYNC_BEGIN: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const CLEAR_LINE: &str = "\x1b[2K";
const CLEAR_SCROLLBACK_SCREEN_HOME: &str = "\x1b[3J\x1b[2J\x1b[H";

/// Inputs for one draw, resolved by the engine per frame.
pub(crate) struct DrawRequest {
    /// Composed frame lines.
    pub lines: Vec<String>,
    /// Terminal width the frame was rendered for.
    pub width: usize,
    /// Terminal height.
    pub rows: usize,
    /// Cursor-marker position `(row, col)`, if a focused component
    /// placed one.
    pub cursor: Option<(usize, usize)>,
    /// Show the OS cursor at the marker position.
    pub show_hardware_cursor: bool,
    /// Whether any overlay is currently visible.
    pub has_overlays: bool,
    /// Full-redraw-on-shrink heuristic enabled.
    pub clear_on_shrink: bool,
}

/// Why a full redraw was taken; logged under `PI_DEBUG_REDRAW`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RedrawReason {
    WidthChanged,
    Shrank,
    ChangedAboveViewport,
}

/// Frame state and the differential write algorithm.
#[derive(Debug, Default)]
pub(crate) struct DiffDrawer {
    /// Last frame actually drawn.
    previous_lines: Vec<String>,
    /// Terminal width at last draw.
    previous_width: usize,
    /// Logical row of the end of rendered content.
    cursor_row: usize,
    /// Content row the terminal cursor actually sits on.
    hardware_cursor_row: usize,
    /// Height of the working area; monotonically non-decreasing until
    /// a scrollback-clearing redraw resets it.
    max_lines_rendered: usize,
    /// `max(0, max_lines_rendered - rows)` at last draw.
    previous_viewport_top: usize,
}

impl DiffDrawer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Last frame's lines (for overlay canvas-height stability).
    pub(crate) fn max_lines_rendered(&self) -> usize {
        self.max_lines_rendered
    }

    pub(crate) fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub(crate) fn hardware_cursor_row(&self) -> usize {
        self.hardware_cursor_row
    }

    /// Forget the previous frame so the next draw rewrites everything.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Draw one frame.
    pub(crate) fn draw<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        request: DrawRequest,
        log_redraws: bool,
    ) -> Result<()> {
        let width_changed = self.previous_width != 0 && self.previous_width != request.width;

        if self.previous_lines.is_empty() && !width_changed {
            return self.draw_initial(terminal, request);
        }

        let (first_changed, last_changed) = self.changed_range(&request.lines);

        let redraw_reason = if width_changed {
            Some(RedrawReason::WidthChanged)
        } else if request.lines.len() < self.previous_lines.len()
            && !request.has_overlays
            && request.clear_on_shrink
        {
            Some(RedrawReason::Shrank)
        } else if first_changed.is_some_and(|f| f < self.previous_viewport_top) {
            Some(RedrawReason::ChangedAboveViewport)
        } else {
            None
        };

        if let Some(reason) = redraw_reason {
            if log_redraws {
                tracing::info!(?reason, "full redraw");
            }
            return self.draw_full(terminal, request);
        }

        self.draw_differential(terminal, request, first_changed, last_changed)
    }

    /// First draw onto an assumed-clean screen.
    fn draw_initial<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        request: DrawRequest,
    ) -> Result<()> {
        let mut out = String::new();
        for (i, line) in request.lines.iter().enumerate() {
            if i > 0 {
                out.push_str("\r\n");
            }
            out.push_str(line);
        }
        terminal.write(&out)?;
        self.hardware_cursor_row = request.lines.len().saturating_sub(1);
        self.commit(terminal, request)
    }

    /// Scrollback-clearing full rewrite; resets the working area.
    fn draw_full<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        request: DrawRequest,
    ) -> Result<()> {
        let mut out = String::from(CLEAR_SCROLLBACK_SCREEN_HOME);
        for (i, line) in request.lines.iter().enumerate() {
            if i > 0 {
                out.push_str("\r\n");
            }
            out.push_str(line);
        }
        terminal.write(&out)?;
        self.hardware_cursor_row = request.lines.len().saturating_sub(1);
        self.max_lines_rendered = 0;
        self.commit(terminal, request)
    }

    /// In-place update of the changed line range.
    fn draw_differential<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        request: DrawRequest,
        first_changed: Option<usize>,
        last_changed: Option<usize>,
    ) -> Result<()> {
        let mut out = String::from(SYNC_BEGIN);

        if let (Some(first), Some(last)) = (first_changed, last_changed) {
            // Bottom of the viewport in content rows.
            let viewport_bottom = self.previous_viewport_top + request.rows.saturating_sub(1);
            let mut cursor = self.hardware_cursor_row;
            if first > viewport_bottom {
                // The only deliberate scroll: feed newlines at the
                // bottom until the target row is visible.
                move_vertical(&mut out, viewport_bottom as isize - cursor as isize);
                out.push('\r');
                for _ in 0..first - viewport_bottom {
                    out.push('\n');
                }
                cursor = first;
            } else {
                move_vertical(&mut out, first as isize - cursor as isize);
                out.push('\r');
                cursor = first;
            }

            for row in first..=last {
                if row > cursor {
                    // Advance; LF scrolls when the cursor sits on the
                    // bottom screen row.
                    out.push('\n');
                    cursor = row;
                }
                let changed = self
                    .previous_lines
                    .get(row)
                    .is_none_or(|prev| prev != &request.lines[row]);
                if changed {
                    out.push('\r');
                    out.push_str(CLEAR_LINE);
                    out.push_str(&request.lines[row]);
                }
            }
            self.hardware_cursor_row = cursor;
        }

        // Clear rows the previous frame used beyond the new content,
        // bottom-up, then park at the end of the new content.
        if self.previous_lines.len() > request.lines.len() {
            let new_end = request.lines.len().saturating_sub(1) as isize;
            let mut cursor = self.hardware_cursor_row as isize;
            for row in (request.lines.len()..self.previous_lines.len()).rev() {
                move_vertical(&mut out, row as isize - cursor);
                cursor = row as isize;
                out.push_str(CLEAR_LINE);
            }
            move_vertical(&mut out, new_end - cursor);
            self.hardware_cursor_row = new_end.max(0) as usize;
        }

        out.push_str(SYNC_END);
        terminal.write(&out)?;
        self.commit(terminal, request)
    }

    /// Indices of the first and last lines that differ from the
    /// previous frame (rows past either end count as changed).
    fn changed_range(&self, new_lines: &[String]) -> (Option<usize>, Option<usize>) {
        let common = self.previous_lines.len().min(new_lines.len());
        let mut first = None;
        for i in 0..common {
            if self.previous_lines[i] != new_lines[i] {
                first = Some(i);
                break;
            }
        }
        if first.is_none() && new_lines.len() > common {
            first = Some(common);
        }
        let first = match first {
            Some(f) => f,
            None => return (None, None),
        };
        let mut last = first;
        for i in (first..common).rev() {
            if self.previous_lines[i] != new_lines[i] {
                last = i;
                break;
            }
        }
        if new_lines.len() > common {
            last = new_lines.len() - 1;
        }
        (Some(first), Some(last))
    }

    /// Update render state and park the hardware cursor at the marker.
    fn commit<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        request: DrawRequest,
    ) -> Result<()> {
        self.cursor_row = request.lines.len().saturating_sub(1);
        self.max_lines_rendered = self.max_lines_rendered.max(request.lines.len());
        self.previous_viewport_top = self.max_lines_rendered.saturating_sub(request.rows);
        self.previous_lines = request.lines;
        self.previous_width = request.width;

        if let Some((row, col)) = request.cursor {
            let delta = row as isize - self.hardware_cursor_row as isize;
            let mut out = String::new();
            move_vertical(&mut out, delta);
            out.push_str(&format!("\x1b[{}G", col + 1));
            terminal.write(&out)?;
            self.hardware_cursor_row = row;
            if request.show_hardware_cursor {
                terminal.show_cursor()?;
            } else {
                terminal.hide_cursor()?;
            }
        } else {
            terminal.hide_cursor()?;
        }
        terminal.flush()?;

        debug_assert!(
            self.hardware_cursor_row <= self.previous_lines.len().max(1) - 1,
            "hardware cursor outside content"
        );
        Ok(())
    }
}

/// Append a relative vertical move: negative up (`CSI nA`), positive
/// down (`CSI nB`).
fn move_vertical(out: &mut String, delta: isize) {
    if delta < 0 {
        out.push_str(&format!("\x1b[{}A", -delta));
    } else if delta > 0 {
        out.push_str(&format!("\x1b[{}B", delta));
    }
}
