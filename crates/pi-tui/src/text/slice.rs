//! Column slicing that preserves SGR state.
//!
//! The overlay compositor needs to keep the part of a base line to the
//! left of an overlay and resume the part to its right, with the styles
//! that were active at the resume point re-established. [`slice`] is
//! the general single-range form; [`extract_segments`] is the fused
//! two-range version used per composited line.

use unicode_segmentation::UnicodeSegmentation;

use super::sgr::SgrTracker;
use super::width::{grapheme_width, sequence_len};

/// The two base-line pieces surrounding an overlay, from one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedSegments {
    /// Content left of the overlay (columns `0..before_end`).
    pub before: String,
    /// Visible width of `before`.
    pub before_width: usize,
    /// Content right of the overlay, prefixed with the SGR state that
    /// was active at `after_start`.
    pub after: String,
    /// Visible width of `after`.
    pub after_width: usize,
}

/// Extract the visible column range `[start, start + len)` from `line`.
///
/// SGR codes that precede the range are tracked and re-emitted just
/// before the first visible character that remains. With `strict`, a
/// wide grapheme that would cross the right boundary is excluded;
/// otherwise it is included and the result overflows by one column.
pub fn slice(line: &str, start: usize, len: usize, strict: bool) -> String {
    let mut out = String::new();
    let mut walker = Walker::new(line);
    let end = start.saturating_add(len);
    let mut emitting = false;

    while let Some(step) = walker.next_step() {
        match step {
            Step::Codes(raw) => {
                if emitting && walker.col <= end {
                    out.push_str(raw);
                }
            }
            Step::Grapheme { raw, width, col } => {
                if col >= end {
                    break;
                }
                let fits_left = col >= start;
                let fits_right = if strict {
                    col + width <= end
                } else {
                    col < end
                };
                if fits_left && fits_right {
                    if !emitting {
                        if let Some(codes) = walker.tracker_before.active_codes() {
                            out.push_str(&codes);
                        }
                        emitting = true;
                    }
                    out.push_str(raw);
                }
            }
        }
    }
    out
}

/// Single-pass extraction of the columns before `before_end` and the
/// `after_len` columns starting at `after_start`.
///
/// `strict_after` controls whether a wide grapheme crossing the right
/// edge of the after-range is excluded.
pub fn extract_segments(
    line: &str,
    before_end: usize,
    after_start: usize,
    after_len: usize,
    strict_after: bool,
) -> ExtractedSegments {
    let mut result = ExtractedSegments::default();
    let mut walker = Walker::new(line);
    let after_end = after_start.saturating_add(after_len);
    let mut after_emitting = false;

    while let Some(step) = walker.next_step() {
        match step {
            Step::Codes(raw) => {
                if walker.col < before_end {
                    result.before.push_str(raw);
                } else if after_emitting && walker.col <= after_end {
                    result.after.push_str(raw);
                }
            }
            Step::Grapheme { raw, width, col } => {
                if col + width <= before_end {
                    result.before.push_str(raw);
                    result.before_width += width;
                    continue;
                }
                if col >= after_end {
                    break;
                }
                let fits_right = if strict_after {
                    col + width <= after_end
                } else {
                    col < after_end
                };
                if col >= after_start && fits_right {
                    if !after_emitting {
                        if let Some(codes) = walker.tracker_before.active_codes() {
                            result.after.push_str(&codes);
                        }
                        after_emitting = true;
                    }
                    result.after.push_str(raw);
                    result.after_width += width;
                }
            }
        }
    }
    result
}

enum Step<'a> {
    /// A run of escape sequences (zero width).
    Codes(&'a str),
    /// One grapheme at a visible column.
    Grapheme {
        raw: &'a str,
        width: usize,
        col: usize,
    },
}

/// Grapheme-by-grapheme scanner tracking column and SGR state.
struct Walker<'a> {
    rest: &'a str,
    col: usize,
    /// State as of the last yielded step (codes fed eagerly).
    tracker_before: SgrTracker,
}

impl<'a> Walker<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            rest: line,
            col: 0,
            tracker_before: SgrTracker::new(),
        }
    }

    fn next_step(&mut self) -> Option<Step<'a>> {
        let rest: &'a str = self.rest;
        if rest.is_empty() {
            return None;
        }
        if rest.starts_with('\x1b') {
            let mut len = 0;
            while rest[len..].starts_with('\x1b') {
                len += sequence_len(&rest[len..]);
            }
            let raw = &rest[..len];
            let mut feed = raw;
            while let Some(pos) = feed.find('\x1b') {
                let seq = &feed[pos..];
                let seq_len = sequence_len(seq);
                self.tracker_before.feed(&seq[..seq_len]);
                feed = &seq[seq_len..];
            }
            self.rest = &rest[len..];
            return Some(Step::Codes(raw));
        }
        let grapheme = rest.graphemes(true).next()?;
        let width = grapheme_width(grapheme);
        let col = self.col;
        self.col += width;
        self.rest = &rest[grapheme.len()..];
        Some(Step::Grapheme {
            raw: grapheme,
            width,
            col,
        })
    }
}
