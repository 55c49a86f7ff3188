use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Collapse every whitespace run to a single space and trim both ends.
pub fn sanitize_fragment(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of leading whitespace characters in `text`.
pub fn count_leading_whitespace(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

/// Whitespace-separated token count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Repair glyph-level artifacts of decoded PDF strings.
///
/// Applies NFC normalization, expands the Latin ligatures and drops the
/// Unicode replacement character. Whitespace is preserved so callers can
/// still observe leading indentation.
pub fn normalize_glyphs(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    result.replace('\u{FFFD}', "")
}

/// `true` when `text` ends with a hyphen, ignoring trailing whitespace.
pub fn ends_with_hyphen(text: &str) -> bool {
    static RE_HYPHEN: OnceLock<Regex> = OnceLock::new();
    let re = RE_HYPHEN.get_or_init(|| Regex::new(r"-\s*$").unwrap());
    re.is_match(text)
}

/// Join two runs of flowing text.
///
/// A trailing hyphen on the left side is dropped and the halves are glued
/// together; otherwise they are joined with one space. An empty side yields
/// the other side.
pub fn join_flowing_text(first: &str, second: &str) -> String {
    let left = sanitize_fragment(first);
    let right = sanitize_fragment(second);

    if left.is_empty() {
        return right;
    }
    if right.is_empty() {
        return left;
    }
    match left.strip_suffix('-') {
        Some(stem) => format!("{}{}", stem, right),
        None => format!("{} {}", left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_fragment("  Hello \t\n world  "), "Hello world");
    }

    #[test]
    fn test_sanitize_empty_input() {
        assert_eq!(sanitize_fragment("   "), "");
    }

    #[test]
    fn test_count_leading_whitespace() {
        assert_eq!(count_leading_whitespace("   indented"), 3);
        assert_eq!(count_leading_whitespace("\t x"), 2);
        assert_eq!(count_leading_whitespace("none"), 0);
        assert_eq!(count_leading_whitespace(""), 0);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(" one  two\tthree "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(normalize_glyphs("\u{FB01}nd"), "find");
        assert_eq!(normalize_glyphs("a\u{FB04}e"), "affle");
    }

    #[test]
    fn test_replacement_char_removed() {
        assert_eq!(normalize_glyphs("Hello\u{FFFD}World"), "HelloWorld");
    }

    #[test]
    fn test_nfc_normalization() {
        let result = normalize_glyphs("caf\u{0065}\u{0301}");
        assert_eq!(result, "caf\u{00E9}");
    }

    #[test]
    fn test_normalize_keeps_leading_whitespace() {
        assert_eq!(normalize_glyphs("  item"), "  item");
    }

    #[test]
    fn test_ends_with_hyphen() {
        assert!(ends_with_hyphen("infor-"));
        assert!(ends_with_hyphen("infor-  "));
        assert!(!ends_with_hyphen("in-formation"));
    }

    #[test]
    fn test_join_flowing_text_hyphen() {
        assert_eq!(join_flowing_text("infor-", "mation"), "information");
    }

    #[test]
    fn test_join_flowing_text_space() {
        assert_eq!(join_flowing_text("Hello", "world"), "Hello world");
    }

    #[test]
    fn test_join_flowing_text_empty_sides() {
        assert_eq!(join_flowing_text("", "right"), "right");
        assert_eq!(join_flowing_text("left", "  "), "left");
    }
}
