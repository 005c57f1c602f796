//! The engine: component tree, overlay stack, focus, and the frame
//! pipeline feeding the differential drawer.
//!
//! Single-threaded cooperative: input dispatch and rendering both run
//! on the event thread. Rendering is coalesced — any number of
//! [`request_render`](Tui::request_render) calls between two ticks
//! produce exactly one draw.

use std::rc::{Rc, Weak};

use crate::component::{CURSOR_MARKER, Component, ComponentHandle, ComponentRef, Container};
use crate::debug::{self, DebugConfig};
use crate::draw::{DiffDrawer, DrawRequest};
use crate::error::{PiTuiError, Result};
use crate::input::{KeyEventKind, has_release_or_repeat, parse_key};
use crate::overlay::OverlayOptions;
use crate::terminal::{Backend, Terminal};
use crate::text::{extract_segments, visible_width};

/// Reset emitted at overlay segment boundaries and line ends: full SGR
/// reset plus an empty OSC 8 so an open hyperlink cannot span them.
const SEGMENT_RESET: &str = "\x1b[0m\x1b]8;;\x1b\\";

/// One overlay stack entry.
struct OverlayEntry {
    component: ComponentHandle,
    options: OverlayOptions,
    /// Focus to restore when this overlay goes away. Weak: it must not
    /// keep the component alive.
    pre_focus: Option<ComponentRef>,
    /// Soft-hide that preserves the stack position.
    hidden: bool,
}

impl OverlayEntry {
    fn is_visible(&self, cols: usize, rows: usize) -> bool {
        !self.hidden && self.options.is_visible(cols, rows)
    }
}

/// Handle identifying an overlay in the stack.
#[derive(Clone)]
pub struct OverlayHandle(ComponentRef);

/// The terminal UI engine.
pub struct Tui<B: Backend> {
    terminal: Terminal<B>,
    root: Container,
    overlays: Vec<OverlayEntry>,
    focused: Option<ComponentRef>,
    drawer: DiffDrawer,
    render_requested: bool,
    config: DebugConfig,
    frame: u64,
}

impl<B: Backend> Tui<B> {
    /// Create an engine over a terminal, reading debug knobs from the
    /// environment.
    pub fn new(terminal: Terminal<B>) -> Self {
        Self::with_config(terminal, DebugConfig::from_env())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(terminal: Terminal<B>, config: DebugConfig) -> Self {
        Self {
            terminal,
            root: Container::new(),
            overlays: Vec::new(),
            focused: None,
            drawer: DiffDrawer::new(),
            render_requested: false,
            config,
            frame: 0,
        }
    }

    /// The terminal adapter.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// The terminal adapter, mutably.
    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    /// Start the terminal (raw mode, bracketed paste, protocol query).
    pub fn start(&mut self) -> Result<()> {
        self.terminal.start()
    }

    /// Restore the terminal.
    pub fn stop(&mut self) -> Result<()> {
        self.terminal.stop()
    }

    /// Append a root-level child.
    pub fn add_child(&mut self, child: ComponentHandle) {
        self.root.add_child(child);
        self.request_render();
    }

    /// Remove a root-level child.
    pub fn remove_child(&mut self, child: &ComponentHandle) {
        self.root.remove_child(child);
        self.request_render();
    }

    /// Remove all root-level children.
    pub fn clear_children(&mut self) {
        self.root.clear();
        self.request_render();
    }

    /// Move focus, clearing the flag on the previous holder.
    pub fn set_focus(&mut self, target: Option<&ComponentHandle>) {
        if let Some(prev) = self.focused.take().and_then(|w| w.upgrade()) {
            prev.borrow_mut().set_focused(false);
        }
        if let Some(component) = target {
            component.borrow_mut().set_focused(true);
            self.focused = Some(Rc::downgrade(component));
        }
        self.request_render();
    }

    /// The component currently holding focus, if it is still alive.
    pub fn focused_component(&self) -> Option<ComponentHandle> {
        self.focused.as_ref().and_then(Weak::upgrade)
    }

    /// Push an overlay. A visible overlay takes focus; the previous
    /// focus is recorded for restoration.
    pub fn show_overlay(
        &mut self,
        component: ComponentHandle,
        options: OverlayOptions,
    ) -> OverlayHandle {
        let handle = OverlayHandle(Rc::downgrade(&component));
        let (cols, rows) = self.size();
        let visible = options.is_visible(cols, rows);
        self.overlays.push(OverlayEntry {
            component: component.clone(),
            options,
            pre_focus: self.focused.clone(),
            hidden: false,
        });
        if visible {
            self.set_focus(Some(&component));
        }
        self.request_render();
        handle
    }

    /// Pop an overlay from the stack. Focus moves to the topmost still
    /// visible overlay, or to the popped overlay's recorded pre-focus.
    pub fn close_overlay(&mut self, handle: &OverlayHandle) {
        let Some(component) = handle.0.upgrade() else {
            return;
        };
        let Some(index) = self
            .overlays
            .iter()
            .position(|e| Rc::ptr_eq(&e.component, &component))
        else {
            return;
        };
        let entry = self.overlays.remove(index);
        self.restore_focus_from(&entry);
        self.request_render();
    }

    /// Soft-hide or reveal an overlay without changing its stack
    /// position. Hiding a focused overlay behaves like popping it for
    /// focus purposes.
    pub fn set_overlay_hidden(&mut self, handle: &OverlayHandle, hidden: bool) {
        let Some(component) = handle.0.upgrade() else {
            return;
        };
        let Some(index) = self
            .overlays
            .iter()
            .position(|e| Rc::ptr_eq(&e.component, &component))
        else {
            return;
        };
        if self.overlays[index].hidden == hidden {
            return;
        }
        self.overlays[index].hidden = hidden;
        if hidden {
            let held_focus = self
                .focused_component()
                .is_some_and(|f| Rc::ptr_eq(&f, &component));
            if held_focus {
                let entry = &self.overlays[index];
                let pre = entry.pre_focus.clone();
                let target = self
                    .topmost_visible_overlay()
                    .or_else(|| pre.and_then(|w| w.upgrade()));
                self.set_focus(target.as_ref());
            }
        } else {
            let (cols, rows) = self.size();
            if self.overlays[index].is_visible(cols, rows) {
                self.set_focus(Some(&component));
            }
        }
        self.request_render();
    }

    /// Number of overlays in the stack (hidden ones included).
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn restore_focus_from(&mut self, entry: &OverlayEntry) {
        let target = self
            .topmost_visible_overlay()
            .or_else(|| entry.pre_focus.clone().and_then(|w| w.upgrade()));
        self.set_focus(target.as_ref());
    }

    fn topmost_visible_overlay(&self) -> Option<ComponentHandle> {
        let (cols, rows) = self.size();
        self.overlays
            .iter()
            .rev()
            .find(|e| e.is_visible(cols, rows))
            .map(|e| e.component.clone())
    }

    fn size(&self) -> (usize, usize) {
        (self.terminal.columns(), self.terminal.rows())
    }

    /// Ask for a draw on the next tick. Cheap and idempotent.
    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Whether a draw is pending.
    pub fn render_pending(&self) -> bool {
        self.render_requested
    }

    /// A resize only schedules a render; the new size is read at draw
    /// time.
    pub fn handle_resize(&mut self) {
        self.request_render();
    }

    /// Route one input sequence.
    ///
    /// Terminal protocol responses (Kitty ack, cell-size report) are
    /// consumed. Release events are dropped unless the receiving
    /// component opted in. The focused component receives everything
    /// else, with focus transparently redirected away from overlays
    /// whose visibility predicate turned false.
    pub fn handle_input(&mut self, data: &str) {
        if self.terminal.handle_protocol_response(data) {
            self.request_render();
            return;
        }
        self.redirect_focus_from_invisible_overlay();
        let Some(component) = self.focused_component() else {
            return;
        };
        if has_release_or_repeat(data) {
            let wants_release = component.borrow().wants_key_release();
            let is_release = parse_key(data).is_some_and(|e| e.kind == KeyEventKind::Release);
            if is_release && !wants_release {
                return;
            }
        }
        component.borrow_mut().handle_input(data);
        self.request_render();
    }

    /// Deliver bracketed-paste content to the focused component.
    pub fn handle_paste(&mut self, content: &str) {
        self.redirect_focus_from_invisible_overlay();
        let Some(component) = self.focused_component() else {
            return;
        };
        component.borrow_mut().handle_input(content);
        self.request_render();
    }

    /// If focus sits on an overlay that is no longer visible, move it
    /// to the topmost visible overlay or that entry's pre-focus.
    fn redirect_focus_from_invisible_overlay(&mut self) {
        let Some(focused) = self.focused_component() else {
            return;
        };
        let (cols, rows) = self.size();
        let Some(index) = self
            .overlays
            .iter()
            .position(|e| Rc::ptr_eq(&e.component, &focused))
        else {
            return;
        };
        if self.overlays[index].is_visible(cols, rows) {
            return;
        }
        let pre = self.overlays[index].pre_focus.clone();
        let target = self
            .topmost_visible_overlay()
            .or_else(|| pre.and_then(|w| w.upgrade()));
        self.set_focus(target.as_ref());
    }

    /// Perform the coalesced draw if one was requested.
    pub fn tick(&mut self) -> Result<()> {
        if !self.render_requested {
            return Ok(());
        }
        self.render_requested = false;
        self.render_frame()
    }

    /// Compose and draw one frame.
    fn render_frame(&mut self) -> Result<()> {
        let (cols, rows) = self.size();
        self.redirect_focus_from_invisible_overlay();

        let mut lines = self.root.render(cols);
        let has_overlays = self.composite_overlays(&mut lines, cols, rows);
        let cursor = locate_and_strip_marker(&mut lines, rows);
        apply_line_resets(&mut lines);

        if let Some(violation) = self.check_width_contract(&lines, cols) {
            self.terminal.restore_on_fatal();
            return Err(violation);
        }

        self.frame += 1;
        if self.config.frame_dumps {
            debug::dump_frame(self.frame, cols, &lines, cursor);
        }

        let request = DrawRequest {
            lines,
            width: cols,
            rows,
            cursor,
            show_hardware_cursor: self.config.hardware_cursor,
            has_overlays,
            clear_on_shrink: self.config.clear_on_shrink,
        };
        match self.drawer.draw(&mut self.terminal, request, self.config.log_redraws) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.terminal.restore_on_fatal();
                Err(e)
            }
        }
    }

    /// Composite every visible overlay into `lines`. Returns whether
    /// any overlay was composited.
    fn composite_overlays(&mut self, lines: &mut Vec<String>, cols: usize, rows: usize) -> bool {
        let mut any = false;
        for index in 0..self.overlays.len() {
            let visible = self.overlays[index].is_visible(cols, rows);
            if !visible {
                continue;
            }
            any = true;
            let (width, max_height) = self.overlays[index].options.resolve_size(cols, rows);
            let mut overlay_lines = self.overlays[index].component.borrow_mut().render(width);
            if let Some(max) = max_height {
                overlay_lines.truncate(max);
            }
            let height = overlay_lines.len();
            let (col, row) =
                self.overlays[index]
                    .options
                    .resolve_position((width, height), cols, rows);

            // Keep positions stable when base content shrinks: the
            // canvas is at least as tall as the working area.
            let canvas_height = lines
                .len()
                .max(self.drawer.max_lines_rendered())
                .max(row + height);
            while lines.len() < canvas_height {
                lines.push(String::new());
            }

            for (i, overlay_line) in overlay_lines.iter().enumerate() {
                let target = row + i;
                let composited = composite_line(&lines[target], overlay_line, col, width, cols);
                lines[target] = composited;
            }
        }
        any
    }

    /// Fatal width check: every composed line must fit the terminal.
    fn check_width_contract(&self, lines: &[String], cols: usize) -> Option<PiTuiError> {
        let widths: Vec<usize> = lines.iter().map(|l| visible_width(l)).collect();
        let worst = widths.iter().copied().max().unwrap_or(0);
        if worst <= cols {
            return None;
        }
        let dump = debug::write_crash_dump(lines, &widths, cols);
        Some(PiTuiError::ContractViolation {
            width: worst,
            max: cols,
            dump,
        })
    }
}

/// Splice one overlay line into a base line at a column.
fn composite_line(
    base: &str,
    overlay_line: &str,
    col: usize,
    overlay_width: usize,
    cols: usize,
) -> String {
    let after_start = col + overlay_width;
    let after_len = cols.saturating_sub(after_start);
    let segments = extract_segments(base, col, after_start, after_len, true);

    let mut out = String::with_capacity(base.len() + overlay_line.len() + 32);
    out.push_str(&segments.before);
    for _ in segments.before_width..col {
        out.push(' ');
    }
    out.push_str(SEGMENT_RESET);
    out.push_str(overlay_line);
    for _ in visible_width(overlay_line)..overlay_width {
        out.push(' ');
    }
    out.push_str(SEGMENT_RESET);
    out.push_str(&segments.after);
    out
}

/// Find the cursor marker in the bottom `rows` lines, strip it, and
/// return its `(row, visible column)`.
fn locate_and_strip_marker(lines: &mut [String], rows: usize) -> Option<(usize, usize)> {
    let start = lines.len().saturating_sub(rows);
    for row in (start..lines.len()).rev() {
        if let Some(pos) = lines[row].find(CURSOR_MARKER) {
            let col = visible_width(&lines[row][..pos]);
            let line = &mut lines[row];
            line.replace_range(pos..pos + CURSOR_MARKER.len(), "");
            return Some((row, col));
        }
    }
    None
}

/// Append the per-line reset so styles and hyperlinks cannot leak past
/// a line end. Image lines (Kitty APC) are left untouched.
fn apply_line_resets(lines: &mut [String]) {
    for line in lines.iter_mut() {
        if line.is_empty() || line.contains("\x1b_G") {
            continue;
        }
        line.push_str(SEGMENT_RESET);
    }
}
