//! End-to-end engine scenarios against the capture backend.

use pi_tui::{
    Component, DebugConfig, OverlayOptions, Terminal, TestBackend, Text, Tui, component,
    visible_width, wrap,
};

fn engine(cols: u16, rows: u16) -> Tui<TestBackend> {
    Tui::with_config(
        Terminal::new(TestBackend::new(cols, rows)),
        DebugConfig::default(),
    )
}

fn tick(tui: &mut Tui<TestBackend>) -> String {
    match tui.tick() {
        Ok(()) => {}
        Err(e) => unreachable!("tick failed: {e}"),
    }
    let out = tui.terminal().backend().output_str();
    tui.terminal_mut().backend_mut().clear_output();
    out
}

#[test]
fn ansi_wrap_preserves_underline_runs() {
    let lines = wrap("\x1b[4munderlined text\x1b[0m", 6);
    assert_eq!(
        lines,
        vec![
            "\x1b[4munder\x1b[24m",
            "\x1b[4mlined\x1b[24m",
            "\x1b[4mtext\x1b[0m",
        ]
    );
}

#[test]
fn differential_update_rewrites_only_changed_line() {
    let mut tui = engine(80, 24);
    let text = component(Text::new("A\nB\nC"));
    tui.add_child(text.clone());
    let _ = tick(&mut tui);

    text.borrow_mut().set_text("A\nB2\nC");
    tui.request_render();
    let out = tick(&mut tui);

    assert!(out.contains("\x1b[?2026h"), "missing sync begin");
    assert!(out.contains("\x1b[?2026l"), "missing sync end");
    assert!(out.contains("\x1b[2KB2"), "changed line not rewritten");
    assert!(!out.contains("\x1b[2J"), "unexpected screen clear");
    assert!(!out.contains("\x1b[3J"), "unexpected scrollback clear");
    assert!(!out.contains('A'), "unchanged line rewritten");
    assert!(!out.contains('C'), "unchanged line rewritten");
}

#[test]
fn overlay_composites_at_exact_columns() {
    let mut tui = engine(20, 6);
    tui.add_child(component(Text::new("─".repeat(20))));
    let overlay = component(Text::new("│X│"));
    tui.show_overlay(overlay, OverlayOptions::new().width(3).row(0).col(5));
    let out = tick(&mut tui);

    let reset = "\x1b[0m\x1b]8;;\x1b\\";
    let expected = format!(
        "{before}{reset}│X│{reset}{after}",
        before = "─".repeat(5),
        after = "─".repeat(12),
    );
    assert!(out.contains(&expected), "composited line mismatch: {out:?}");
}

#[test]
fn composited_frame_stays_within_terminal_width() {
    let mut tui = engine(20, 6);
    tui.add_child(component(Text::new("x".repeat(20))));
    let overlay = component(Text::new("pop"));
    tui.show_overlay(overlay, OverlayOptions::new().width(10).row(0).col(15));
    // Overlay position is clamped so the frame still fits.
    let out = tick(&mut tui);
    assert!(out.contains("pop"));
}

#[test]
fn overlay_keeps_canvas_height_stable_when_base_shrinks() {
    let mut tui = engine(20, 6);
    let text = component(Text::new("1\n2\n3\n4"));
    tui.add_child(text.clone());
    let overlay = component(Text::new("OV"));
    tui.show_overlay(overlay, OverlayOptions::new().width(2).row(3).col(0));
    let _ = tick(&mut tui);

    // Base shrinks; the overlay row must stay put thanks to the
    // working-area padding (no full redraw, overlays active).
    text.borrow_mut().set_text("1");
    tui.request_render();
    let out = tick(&mut tui);
    assert!(!out.contains("\x1b[3J"));
}

#[test]
fn resize_triggers_full_redraw_on_next_tick() {
    let mut tui = engine(40, 12);
    tui.add_child(component(Text::new("resize me please")));
    let _ = tick(&mut tui);

    tui.terminal_mut().backend_mut().set_size(30, 12);
    tui.handle_resize();
    let out = tick(&mut tui);
    assert!(out.contains("\x1b[3J\x1b[2J\x1b[H"));
}

#[test]
fn wrapped_frame_lines_respect_contract() {
    let mut tui = engine(12, 6);
    tui.add_child(component(Text::new(
        "a longer paragraph that needs wrapping 你好 ☕ to fit",
    )));
    let out = tick(&mut tui);
    for line in out.split("\r\n") {
        assert!(visible_width(line) <= 12, "line {line:?} overflows");
    }
}

struct Wide;

impl Component for Wide {
    fn render(&mut self, width: usize) -> Vec<String> {
        vec!["w".repeat(width + 5)]
    }
}

#[test]
fn width_violation_surfaces_as_error() {
    let mut tui = engine(10, 4);
    tui.add_child(component(Wide));
    tui.request_render();
    assert!(tui.tick().is_err());
}
