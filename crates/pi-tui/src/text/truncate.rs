//! Visible-width truncation with styling containment.

use unicode_segmentation::UnicodeSegmentation;

use super::width::{grapheme_width, sequence_len, visible_width};

/// Truncate `text` so its visible width is at most `width`.
///
/// Escape sequences pass through untouched. When truncation happens, a
/// full reset (`CSI 0m`) is emitted before `ellipsis` so styling cannot
/// leak into it.
pub fn truncate(text: &str, width: usize, ellipsis: &str) -> String {
    if visible_width(text) <= width {
        return text.to_string();
    }
    let ellipsis_width = visible_width(ellipsis);
    let budget = width.saturating_sub(ellipsis_width);

    let mut out = String::new();
    let mut used = 0usize;
    let mut rest = text;
    while !rest.is_empty() {
        if rest.starts_with('\x1b') {
            let len = sequence_len(rest);
            out.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }
        let grapheme = match rest.graphemes(true).next() {
            Some(g) => g,
            None => break,
        };
        let gw = grapheme_width(grapheme);
        if used + gw > budget {
            break;
        }
        out.push_str(grapheme);
        used += gw;
        rest = &rest[grapheme.len()..];
    }
    out.push_str("\x1b[0m");
    out.push_str(ellipsis);
    out
}

/// Like [`truncate`], but pads with trailing spaces up to `width` when
/// the text is narrower.
pub fn truncate_padded(text: &str, width: usize, ellipsis: &str) -> String {
    let current = visible_width(text);
    if current <= width {
        let mut out = text.to_string();
        out.extend(std::iter::repeat_n(' ', width - current));
        return out;
    }
    truncate(text, width, ellipsis)
}
