//! Benchmarks for wrapping and differential drawing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pi_tui::{DebugConfig, Terminal, TestBackend, Text, Tui, component, visible_width, wrap};

const PARAGRAPH: &str = "\x1b[1mThe quick brown fox\x1b[0m jumps over the lazy dog, \
    然后它穿过了一条狭窄的小巷 ☕ and keeps running until the line has to wrap \
    somewhere sensible.";

fn bench_wrap(c: &mut Criterion) {
    c.bench_function("wrap_styled_paragraph", |b| {
        b.iter(|| wrap(black_box(PARAGRAPH), black_box(40)))
    });
}

fn bench_visible_width(c: &mut Criterion) {
    c.bench_function("visible_width_mixed", |b| {
        b.iter(|| visible_width(black_box(PARAGRAPH)))
    });
}

fn bench_differential_draw(c: &mut Criterion) {
    c.bench_function("diff_draw_one_changed_line", |b| {
        let mut tui = Tui::with_config(
            Terminal::new(TestBackend::new(80, 24)),
            DebugConfig::default(),
        );
        let text = component(Text::new("A\nB\nC\nD\nE"));
        tui.add_child(text.clone());
        let _ = tui.tick();

        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let content = if flip { "A\nB2\nC\nD\nE" } else { "A\nB\nC\nD\nE" };
            text.borrow_mut().set_text(content);
            tui.request_render();
            let _ = tui.tick();
            tui.terminal_mut().backend_mut().clear_output();
        })
    });
}

criterion_group!(
    benches,
    bench_wrap,
    bench_visible_width,
    bench_differential_draw
);
criterion_main!(benches);
