//! Word-boundary classification for cursor motion and kill operations.

use unicode_segmentation::UnicodeSegmentation;

/// Returns true for graphemes that count as whitespace.
pub fn is_whitespace(grapheme: &str) -> bool {
    grapheme.chars().next().is_some_and(char::is_whitespace)
}

/// Returns true for graphemes in the punctuation class.
pub fn is_punctuation(grapheme: &str) -> bool {
    grapheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_punctuation())
}

/// Grapheme index of the end of a forward word motion from `from`.
///
/// Skips whitespace first, then a punctuation run or a word run,
/// whichever the first non-whitespace grapheme belongs to.
pub fn next_word_boundary(graphemes: &[&str], from: usize) -> usize {
    let mut i = from.min(graphemes.len());
    while i < graphemes.len() && is_whitespace(graphemes[i]) {
        i += 1;
    }
    if i < graphemes.len() && is_punctuation(graphemes[i]) {
        while i < graphemes.len() && is_punctuation(graphemes[i]) {
            i += 1;
        }
    } else {
        while i < graphemes.len() && !is_whitespace(graphemes[i]) && !is_punctuation(graphemes[i]) {
            i += 1;
        }
    }
    i
}

/// Grapheme index of the start of a backward word motion from `from`.
///
/// Mirror of [`next_word_boundary`]: trailing whitespace is skipped,
/// then the punctuation or word run before the cursor.
pub fn prev_word_boundary(graphemes: &[&str], from: usize) -> usize {
    let mut i = from.min(graphemes.len());
    while i > 0 && is_whitespace(graphemes[i - 1]) {
        i -= 1;
    }
    if i > 0 && is_punctuation(graphemes[i - 1]) {
        while i > 0 && is_punctuation(graphemes[i - 1]) {
            i -= 1;
        }
    } else {
        while i > 0 && !is_whitespace(graphemes[i - 1]) && !is_punctuation(graphemes[i - 1]) {
            i -= 1;
        }
    }
    i
}

/// Split a line into grapheme clusters.
pub fn graphemes(line: &str) -> Vec<&str> {
    line.graphemes(true).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_whitespace() {
        assert!(is_whitespace(" "));
        assert!(is_whitespace("\t"));
        assert!(!is_whitespace("a"));
    }

    #[test]
    fn classifies_punctuation() {
        assert!(is_punctuation("."));
        assert!(is_punctuation("{"));
        assert!(!is_punctuation("a"));
        assert!(!is_punctuation(" "));
    }

    #[test]
    fn forward_skips_word_run() {
        let g = graphemes("hello world");
        assert_eq!(next_word_boundary(&g, 0), 5);
    }

    #[test]
    fn forward_skips_leading_whitespace() {
        let g = graphemes("  hello");
        assert_eq!(next_word_boundary(&g, 0), 7);
    }

    #[test]
    fn forward_stops_after_punctuation_run() {
        let g = graphemes("foo::bar");
        assert_eq!(next_word_boundary(&g, 3), 5);
    }

    #[test]
    fn backward_skips_trailing_whitespace() {
        let g = graphemes("hello   ");
        assert_eq!(prev_word_boundary(&g, 8), 0);
    }

    #[test]
    fn backward_stops_at_word_start() {
        let g = graphemes("hello world");
        assert_eq!(prev_word_boundary(&g, 11), 6);
    }

    #[test]
    fn backward_punctuation_run() {
        let g = graphemes("foo::");
        assert_eq!(prev_word_boundary(&g, 5), 3);
    }

    #[test]
    fn boundaries_clamp() {
        let g = graphemes("ab");
        assert_eq!(next_word_boundary(&g, 5), 2);
        assert_eq!(prev_word_boundary(&g, 0), 0);
    }
}
