//! Visible-width measurement for terminal lines.
//!
//! Width is grapheme-cluster aware and ignores escape sequences (SGR,
//! cursor positioning, OSC hyperlinks, APC markers). Results for
//! non-ASCII strings are cached in a bounded LRU keyed by the source
//! string, since the same lines are measured every frame.

use std::cell::RefCell;
use std::num::NonZeroUsize;

use lru::LruCache;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const WIDTH_CACHE_CAPACITY: usize = 512;

thread_local! {
    static WIDTH_CACHE: RefCell<LruCache<String, usize>> = RefCell::new(LruCache::new(
        NonZeroUsize::new(WIDTH_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
    ));
}

/// Length in bytes of the escape sequence starting at the front of `s`.
///
/// `s` must begin with `ESC`. Returns the full sequence length for CSI,
/// OSC, DCS, and APC introducers (OSC/DCS/APC terminate on `BEL` or
/// `ESC \`), 2 for two-byte escapes, and 1 for a bare trailing `ESC`.
pub(crate) fn sequence_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&0x1b));
    match bytes.get(1) {
        Some(b'[') => {
            // CSI: parameter/intermediate bytes then a final byte 0x40..=0x7E.
            for (i, &b) in bytes.iter().enumerate().skip(2) {
                if (0x40..=0x7e).contains(&b) {
                    return i + 1;
                }
            }
            bytes.len()
        }
        Some(b']') | Some(b'P') | Some(b'_') | Some(b'X') | Some(b'^') => {
            let mut i = 2;
            while i < bytes.len() {
                if bytes[i] == 0x07 {
                    return i + 1;
                }
                if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                    return i + 2;
                }
                i += 1;
            }
            bytes.len()
        }
        Some(_) => 2,
        None => 1,
    }
}

/// Remove all escape sequences, leaving only visible text.
pub(crate) fn strip_sequences(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('\x1b') {
        out.push_str(&rest[..pos]);
        let len = sequence_len(&rest[pos..]);
        rest = &rest[pos + len..];
    }
    out.push_str(rest);
    out
}

/// Display width of a single grapheme cluster in terminal cells.
///
/// Control characters and zero-width clusters contribute 0; emoji
/// presentation sequences contribute 2; everything else follows the
/// East Asian width of its codepoints.
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return 0,
    };
    if chars.as_str().is_empty() && first.is_ascii() {
        return if first.is_ascii_control() { 0 } else { 1 };
    }
    if grapheme.chars().all(is_zero_width_char) {
        return 0;
    }
    // unicode-width measures emoji presentation sequences (including
    // VS16 and ZWJ sequences) as 2 and sums East Asian widths otherwise.
    UnicodeWidthStr::width(grapheme)
}

fn is_zero_width_char(c: char) -> bool {
    if c.is_control() {
        return true;
    }
    matches!(c,
        '\u{200b}'..='\u{200f}' // zero-width space/joiners, directional marks
        | '\u{2060}'            // word joiner
        | '\u{feff}'            // BOM / zero-width no-break space
        | '\u{fe00}'..='\u{fe0f}' // variation selectors
    )
}

/// Visible width of `text` in terminal cells.
///
/// Escape sequences contribute nothing. Pure printable-ASCII strings
/// short-circuit to their byte length; everything else is measured per
/// grapheme cluster and cached.
pub fn visible_width(text: &str) -> usize {
    if text
        .bytes()
        .all(|b| (0x20..=0x7e).contains(&b))
    {
        return text.len();
    }
    WIDTH_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(&width) = cache.get(text) {
            return width;
        }
        let width = measure(text);
        cache.put(text.to_string(), width);
        width
    })
}

fn measure(text: &str) -> usize {
    let stripped = strip_sequences(text);
    stripped.graphemes(true).map(grapheme_width).sum()
}
