//! ANSI-aware word wrapping.
//!
//! Wrapping splits on literal newlines first, then word-wraps each
//! logical line. An [`SgrTracker`] follows the escape sequences so that
//! attributes active at a soft break are re-emitted at the start of the
//! continuation line, and underline is switched off at the break so it
//! cannot bleed into padding. Tokens wider than the wrap width are
//! broken at grapheme boundaries.

use unicode_segmentation::UnicodeSegmentation;

use super::sgr::SgrTracker;
use super::width::{grapheme_width, sequence_len};

/// Underline-off, emitted at soft line breaks while underline is active.
const UNDERLINE_OFF: &str = "\x1b[24m";

/// One visible grapheme plus any escape sequences that precede it.
struct Atom {
    raw: String,
    width: usize,
    is_whitespace: bool,
}

/// Wrap `text` to lines of visible width at most `width`.
///
/// Literal `\n` characters always break; styles carry across them via
/// the tracker. Trailing whitespace on each emitted line is trimmed.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut tracker = SgrTracker::new();
    for (i, logical) in text.split('\n').enumerate() {
        wrap_logical_line(logical, width, &mut tracker, &mut out, i > 0);
    }
    out
}

fn wrap_logical_line(
    line: &str,
    width: usize,
    tracker: &mut SgrTracker,
    out: &mut Vec<String>,
    continuation: bool,
) {
    let (atoms, tail_codes) = tokenize(line);

    let mut current = String::new();
    let mut current_width = 0usize;
    if continuation && !line.is_empty() {
        if let Some(codes) = tracker.active_codes() {
            current.push_str(&codes);
        }
    }

    let mut breaks = 0usize;
    let mut idx = 0;
    while idx < atoms.len() {
        // A token is a maximal run of same-class atoms.
        let is_ws = atoms[idx].is_whitespace;
        let mut end = idx + 1;
        while end < atoms.len() && atoms[end].is_whitespace == is_ws {
            end += 1;
        }
        let token = &atoms[idx..end];
        let token_width: usize = token.iter().map(|a| a.width).sum();

        if current_width + token_width <= width {
            for atom in token {
                current.push_str(&atom.raw);
                feed_atom(tracker, atom);
            }
            current_width += token_width;
        } else if is_ws {
            // Whitespace that does not fit is consumed by the break.
            for atom in token {
                feed_atom(tracker, atom);
            }
            soft_break(out, &mut current, &mut current_width, tracker);
            breaks += 1;
        } else if token_width <= width {
            soft_break(out, &mut current, &mut current_width, tracker);
            breaks += 1;
            for atom in token {
                current.push_str(&atom.raw);
                feed_atom(tracker, atom);
            }
            current_width = token_width;
        } else {
            // Token wider than the wrap width: break at grapheme
            // boundaries, leaving the last column free.
            for atom in token {
                if current_width > 0 && current_width + atom.width >= width {
                    soft_break(out, &mut current, &mut current_width, tracker);
                    breaks += 1;
                }
                current.push_str(&atom.raw);
                feed_atom(tracker, atom);
                current_width += atom.width;
            }
        }
        idx = end;
    }

    if !tail_codes.is_empty() {
        current.push_str(&tail_codes);
        feed_codes(tracker, &tail_codes);
    }
    // After a soft break, a remainder with no visible text would add a
    // spurious blank line (only re-emitted codes survive trimming).
    if breaks > 0 && current_width == 0 {
        return;
    }
    out.push(current.trim_end_matches([' ', '\t']).to_string());
}

/// Emit the current line at a soft break and start the continuation.
fn soft_break(
    out: &mut Vec<String>,
    current: &mut String,
    current_width: &mut usize,
    tracker: &SgrTracker,
) {
    let mut line = current.trim_end_matches([' ', '\t']).to_string();
    if tracker.underline_active() {
        line.push_str(UNDERLINE_OFF);
    }
    out.push(line);
    current.clear();
    *current_width = 0;
    if let Some(codes) = tracker.active_codes() {
        current.push_str(&codes);
    }
}

fn feed_atom(tracker: &mut SgrTracker, atom: &Atom) {
    if atom.raw.contains('\x1b') {
        feed_codes(tracker, &atom.raw);
    }
}

/// Feed every escape sequence embedded in `text` to the tracker.
fn feed_codes(tracker: &mut SgrTracker, text: &str) {
    let mut rest = text;
    while let Some(pos) = rest.find('\x1b') {
        let seq = &rest[pos..];
        let len = sequence_len(seq);
        tracker.feed(&seq[..len]);
        rest = &seq[len..];
    }
}

/// Split a logical line into atoms. Escape sequences attach to the next
/// visible grapheme; sequences after the last grapheme are returned as
/// the tail.
fn tokenize(line: &str) -> (Vec<Atom>, String) {
    let mut atoms = Vec::new();
    let mut pending = String::new();
    let mut rest = line;
    while !rest.is_empty() {
        if rest.starts_with('\x1b') {
            let len = sequence_len(rest);
            pending.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }
        let grapheme = match rest.graphemes(true).next() {
            Some(g) => g,
            None => break,
        };
        let is_whitespace = grapheme.chars().next().is_some_and(char::is_whitespace);
        let mut raw = std::mem::take(&mut pending);
        raw.push_str(grapheme);
        atoms.push(Atom {
            raw,
            width: grapheme_width(grapheme),
            is_whitespace,
        });
        rest = &rest[grapheme.len()..];
    }
    (atoms, pending)
}
