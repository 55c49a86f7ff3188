//! Line classification heuristics.
//!
//! Two baselines are supported:
//!
//! - **Per page** ([`build_page_stats`] + [`classify_line`]): the median line
//!   font size of the page decides headings; list, table, heading and
//!   paragraph rules are checked in that order.
//! - **Per document** ([`determine_dominant_font_size`] +
//!   [`classify_against_dominant`]): a line is a heading when its rounded font
//!   size exceeds the most common rounded size of the whole document. List
//!   markers still win.
//!
//! Every function here is pure; classifying the same line twice gives the
//! same answer.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::lines::DEFAULT_FONT_SIZE;
use crate::render::cleanup::sanitize_fragment;
use crate::types::{BlockType, Line, PageStats};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Font sizes are histogrammed in half-point buckets.
const FONT_SIZE_BUCKETS_PER_POINT: f32 = 2.0;

/// Table lines need at least this many column gaps...
const TABLE_MIN_COLUMNS: usize = 3;
/// ...a word count inside this range...
const TABLE_MIN_WORDS: usize = 3;
const TABLE_MAX_WORDS: usize = 20;
/// ...and a font no larger than `median * TABLE_MAX_FONT_RATIO`.
const TABLE_MAX_FONT_RATIO: f32 = 1.15;

/// Headings have at most this many words and characters.
const HEADING_MAX_WORDS: usize = 16;
const HEADING_MAX_CHARS: usize = 120;
/// Font boost over the page median that marks a heading.
const HEADING_FONT_RATIO: f32 = 1.2;
/// All-caps headings: uppercase ratio and word limit.
const HEADING_UPPERCASE_RATIO: f32 = 0.75;
const HEADING_UPPERCASE_MAX_WORDS: usize = 14;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn list_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*•‣◦▪]|(?:\d+|[A-Za-z])[.)])\s+\S").unwrap())
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*•‣◦▪]+|(?:\d+|[A-Za-z])[.)])\s*(.+)$").unwrap())
}

fn title_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^[A-Z][\w'"()\-]"#).unwrap())
}

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s*$").unwrap())
}

// ---------------------------------------------------------------------------
// Public API: statistics
// ---------------------------------------------------------------------------

/// Round a font size to its half-point bucket.
pub fn font_bucket(size: f32) -> f32 {
    (size * FONT_SIZE_BUCKETS_PER_POINT).round() / FONT_SIZE_BUCKETS_PER_POINT
}

/// Median line font size of a page: the element at `floor(n / 2)` of the
/// sorted positive, finite sizes. Defaults to 11 when there are none.
pub fn build_page_stats(lines: &[Line]) -> PageStats {
    let mut sizes: Vec<f32> = lines
        .iter()
        .map(|l| l.font_size)
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    sizes.sort_by(f32::total_cmp);

    PageStats {
        median_font_size: sizes.get(sizes.len() / 2).copied().unwrap_or(DEFAULT_FONT_SIZE),
    }
}

/// The most frequent half-point font bucket across every line of every
/// page. Ties go to the smaller bucket; 11 when there are no usable sizes.
pub fn determine_dominant_font_size<'a, I>(pages: I) -> f32
where
    I: IntoIterator<Item = &'a [Line]>,
{
    // Keyed by doubled size so the map orders buckets ascending.
    let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
    for lines in pages {
        for line in lines {
            let size = line.font_size;
            if !size.is_finite() || size <= 0.0 {
                continue;
            }
            let key = (size * FONT_SIZE_BUCKETS_PER_POINT).round() as i64;
            *histogram.entry(key).or_insert(0) += 1;
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for (&key, &count) in &histogram {
        // Ascending iteration keeps the smaller bucket on ties.
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((key, count));
        }
    }

    best.map(|(key, _)| key as f32 / FONT_SIZE_BUCKETS_PER_POINT)
        .unwrap_or(DEFAULT_FONT_SIZE)
}

// ---------------------------------------------------------------------------
// Public API: predicates
// ---------------------------------------------------------------------------

/// `true` for lines that start with a bullet or an enumerator followed by
/// whitespace and content.
pub fn is_list_line(text: &str) -> bool {
    list_line_re().is_match(text)
}

/// Strip the list marker from a line, returning the item text.
pub fn list_item_text(text: &str) -> String {
    let value = sanitize_fragment(text);
    match list_item_re().captures(&value).and_then(|c| c.get(1)) {
        Some(m) => sanitize_fragment(m.as_str()),
        None => value,
    }
}

/// Share of uppercase letters among the ASCII letters of `text`.
pub fn uppercase_ratio(text: &str) -> f32 {
    let (letters, upper) = text
        .chars()
        .filter(char::is_ascii_alphabetic)
        .fold((0usize, 0usize), |(n, u), c| {
            (n + 1, u + usize::from(c.is_ascii_uppercase()))
        });
    if letters == 0 {
        0.0
    } else {
        upper as f32 / letters as f32
    }
}

pub fn is_table_line(line: &Line, stats: &PageStats) -> bool {
    line.column_count >= TABLE_MIN_COLUMNS
        && (TABLE_MIN_WORDS..=TABLE_MAX_WORDS).contains(&line.word_count)
        && line.font_size <= stats.median_font_size * TABLE_MAX_FONT_RATIO
}

pub fn is_heading_line(line: &Line, stats: &PageStats) -> bool {
    if line.word_count == 0 || line.word_count > HEADING_MAX_WORDS {
        return false;
    }

    let text = line.text.as_str();
    if text.chars().count() > HEADING_MAX_CHARS || sentence_end_re().is_match(text) {
        return false;
    }

    let font_boost = line.font_size >= stats.median_font_size * HEADING_FONT_RATIO;
    if font_boost && title_case_re().is_match(text) {
        return true;
    }

    uppercase_ratio(text) >= HEADING_UPPERCASE_RATIO
        && line.word_count <= HEADING_UPPERCASE_MAX_WORDS
}

// ---------------------------------------------------------------------------
// Public API: classification
// ---------------------------------------------------------------------------

/// Classify a line against its page statistics. First match wins: list,
/// table, heading, paragraph.
pub fn classify_line(line: &Line, stats: &PageStats) -> BlockType {
    if is_list_line(&line.text) {
        BlockType::List
    } else if is_table_line(line, stats) {
        BlockType::Table
    } else if is_heading_line(line, stats) {
        BlockType::Heading
    } else {
        BlockType::Paragraph
    }
}

/// Classify a line against the document's dominant font size. There is no
/// table path in this variant.
pub fn classify_against_dominant(line: &Line, dominant_font_size: f32) -> BlockType {
    if is_list_line(&line.text) {
        BlockType::List
    } else if is_heading_bucket(line.font_size, dominant_font_size) {
        BlockType::Heading
    } else {
        BlockType::Paragraph
    }
}

/// `true` when the rounded font size lies strictly above the dominant bucket.
pub fn is_heading_bucket(font_size: f32, dominant_font_size: f32) -> bool {
    font_size.is_finite() && font_bucket(font_size) > dominant_font_size
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_line(text: &str, font_size: f32) -> Line {
        Line {
            text: text.to_string(),
            font_size,
            word_count: text.split_whitespace().count(),
            ..Line::default()
        }
    }

    fn stats(median: f32) -> PageStats {
        PageStats {
            median_font_size: median,
        }
    }

    // ====================================================================
    // Statistics
    // ====================================================================

    #[test]
    fn test_page_stats_median_upper_middle() {
        let lines = vec![
            make_line("a", 10.0),
            make_line("b", 18.0),
            make_line("c", 11.0),
            make_line("d", 12.0),
        ];
        // Sorted: [10, 11, 12, 18]; floor(4 / 2) = 2.
        assert_eq!(build_page_stats(&lines).median_font_size, 12.0);
    }

    #[test]
    fn test_page_stats_ignores_invalid_sizes() {
        let lines = vec![
            make_line("a", 0.0),
            make_line("b", f32::NAN),
            make_line("c", 9.0),
        ];
        assert_eq!(build_page_stats(&lines).median_font_size, 9.0);
    }

    #[test]
    fn test_page_stats_default() {
        assert_eq!(build_page_stats(&[]).median_font_size, 11.0);
    }

    #[test]
    fn test_dominant_font_unique_mode() {
        let page = vec![
            make_line("a", 11.1),
            make_line("b", 10.9),
            make_line("c", 11.2),
            make_line("d", 18.0),
        ];
        assert_eq!(determine_dominant_font_size([page.as_slice()]), 11.0);
    }

    #[test]
    fn test_dominant_font_tie_prefers_smaller_bucket() {
        let first = vec![make_line("a", 14.0), make_line("b", 14.0)];
        let second = vec![make_line("c", 10.0), make_line("d", 10.2)];
        assert_eq!(
            determine_dominant_font_size([first.as_slice(), second.as_slice()]),
            10.0
        );
    }

    #[test]
    fn test_dominant_font_half_point_buckets() {
        let page = vec![make_line("a", 10.4), make_line("b", 10.6)];
        assert_eq!(determine_dominant_font_size([page.as_slice()]), 10.5);
    }

    #[test]
    fn test_dominant_font_default() {
        let empty: Vec<Line> = Vec::new();
        assert_eq!(determine_dominant_font_size([empty.as_slice()]), 11.0);
        assert_eq!(determine_dominant_font_size(Vec::<&[Line]>::new()), 11.0);
    }

    // ====================================================================
    // Predicates
    // ====================================================================

    #[test]
    fn test_list_line_markers() {
        assert!(is_list_line("- item one"));
        assert!(is_list_line("• bullet"));
        assert!(is_list_line("  12. numbered"));
        assert!(is_list_line("b) lettered"));
        assert!(!is_list_line("-no space"));
        assert!(!is_list_line("Regular sentence."));
        assert!(!is_list_line("3.14 is pi"));
    }

    #[test]
    fn test_list_item_text_strips_marker() {
        assert_eq!(list_item_text("- item one"), "item one");
        assert_eq!(list_item_text("•• nested"), "nested");
        assert_eq!(list_item_text("4) fourth"), "fourth");
        assert_eq!(list_item_text("plain"), "plain");
    }

    #[test]
    fn test_uppercase_ratio() {
        assert_eq!(uppercase_ratio("ABC def"), 0.5);
        assert_eq!(uppercase_ratio("123 !!"), 0.0);
        assert_eq!(uppercase_ratio("ÉCOLE"), 1.0, "only ASCII letters count");
    }

    // ====================================================================
    // Classification
    // ====================================================================

    #[test]
    fn test_classify_heading_by_font_boost() {
        let heading = make_line("Chapter 1", 18.0);
        let body = make_line("Some body text.", 11.0);
        assert_eq!(classify_line(&heading, &stats(11.0)), BlockType::Heading);
        assert_eq!(classify_line(&body, &stats(11.0)), BlockType::Paragraph);
    }

    #[test]
    fn test_classify_heading_rejects_sentence_end() {
        let line = make_line("This is large.", 18.0);
        assert_eq!(classify_line(&line, &stats(11.0)), BlockType::Paragraph);
    }

    #[test]
    fn test_classify_heading_by_uppercase() {
        let line = make_line("INTRODUCTION AND SCOPE", 11.0);
        assert_eq!(classify_line(&line, &stats(11.0)), BlockType::Heading);
    }

    #[test]
    fn test_classify_uppercase_sentence_is_paragraph() {
        let line = make_line("NOTICE: READ THIS.", 11.0);
        assert_eq!(
            classify_line(&line, &stats(11.0)),
            BlockType::Paragraph,
            "terminal punctuation rules out the uppercase branch too"
        );
    }

    #[test]
    fn test_classify_long_line_is_not_heading() {
        let text = "WORD ".repeat(17);
        let line = make_line(text.trim(), 20.0);
        assert_eq!(classify_line(&line, &stats(11.0)), BlockType::Paragraph);
    }

    #[test]
    fn test_classify_list_wins_over_heading() {
        let line = make_line("- ITEM", 20.0);
        assert_eq!(classify_line(&line, &stats(11.0)), BlockType::List);
    }

    #[test]
    fn test_classify_table() {
        let line = Line {
            column_count: 3,
            ..make_line("Name Age City", 11.0)
        };
        assert_eq!(classify_line(&line, &stats(11.0)), BlockType::Table);
    }

    #[test]
    fn test_classify_table_rejects_large_font() {
        let line = Line {
            column_count: 4,
            ..make_line("Quarterly results by region", 14.0)
        };
        assert_ne!(classify_line(&line, &stats(11.0)), BlockType::Table);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let line = make_line("Results", 16.0);
        let s = stats(11.0);
        assert_eq!(classify_line(&line, &s), classify_line(&line, &s));
    }

    #[test]
    fn test_classify_against_dominant() {
        assert_eq!(
            classify_against_dominant(&make_line("Title", 11.4), 11.0),
            BlockType::Heading,
            "11.4 rounds to 11.5"
        );
        assert_eq!(
            classify_against_dominant(&make_line("Body", 11.2), 11.0),
            BlockType::Paragraph
        );
        assert_eq!(
            classify_against_dominant(&make_line("- Item", 20.0), 11.0),
            BlockType::List
        );
    }
}
