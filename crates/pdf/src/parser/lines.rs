//! Fragment sanitizing and line assembly.
//!
//! Turns the unordered, positioned text runs of one page into lines ordered
//! top to bottom.
//!
//! ```text
//! RawTextItem[]  ->  TextFragment[]  ->  Line[]
//!                    fragment_from_item   build_lines
//! ```
//!
//! Lines are grouped purely by baseline proximity. Two columns that share a
//! baseline end up in the same line; multi-column pages are not reordered.

use crate::render::cleanup::{
    count_leading_whitespace, count_words, normalize_glyphs, sanitize_fragment,
};
use crate::types::{Line, RawTextItem, TextFragment};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Font size used when neither the transform nor the glyph height give a
/// usable estimate.
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Transform scales and heights at or below this are treated as unknown.
const MIN_FONT_ESTIMATE: f32 = 0.5;

/// Baseline tolerance: `max(LINE_Y_TOLERANCE_MIN, font_size * LINE_Y_TOLERANCE_RATIO)`.
const LINE_Y_TOLERANCE_MIN: f32 = 2.0;
const LINE_Y_TOLERANCE_RATIO: f32 = 0.45;

/// Word gap: `max(WORD_GAP_MIN, previous_font_size * WORD_GAP_RATIO)`.
const WORD_GAP_MIN: f32 = 2.0;
const WORD_GAP_RATIO: f32 = 0.2;

/// Column gap: `max(COLUMN_GAP_MIN, font_size * COLUMN_GAP_RATIO)`.
const COLUMN_GAP_MIN: f32 = 28.0;
const COLUMN_GAP_RATIO: f32 = 2.5;

/// Width estimate when the decoder gives none:
/// `max(MIN_ESTIMATED_WIDTH, chars * font_size * CHAR_WIDTH_RATIO)`.
const MIN_ESTIMATED_WIDTH: f32 = 8.0;
const CHAR_WIDTH_RATIO: f32 = 0.45;

// ---------------------------------------------------------------------------
// Public API: fragments
// ---------------------------------------------------------------------------

/// Estimate the rendered font size of a run.
///
/// Uses the magnitude of the first column of the transform, falls back to
/// the glyph box height and finally to [`DEFAULT_FONT_SIZE`].
pub fn estimate_font_size(item: &RawTextItem) -> f32 {
    let a = finite_or_zero(item.transform[0]);
    let b = finite_or_zero(item.transform[1]);
    let scale = a.hypot(b);
    if scale.is_finite() && scale > MIN_FONT_ESTIMATE {
        return scale;
    }
    match item.height {
        Some(h) if h.is_finite() && h > MIN_FONT_ESTIMATE => h,
        _ => DEFAULT_FONT_SIZE,
    }
}

/// Convert a raw run into a [`TextFragment`].
///
/// Returns `None` for runs that are empty after sanitizing or whose origin
/// is not finite.
pub fn fragment_from_item(item: &RawTextItem) -> Option<TextFragment> {
    let raw = normalize_glyphs(&item.text);
    let text = sanitize_fragment(&raw);
    if text.is_empty() {
        return None;
    }

    let x = item.transform[4];
    let y = item.transform[5];
    if !x.is_finite() || !y.is_finite() {
        log::debug!("dropping fragment {:?} with non-finite origin", text);
        return None;
    }

    Some(TextFragment {
        text,
        x,
        y,
        font_size: estimate_font_size(item),
        leading_whitespace: count_leading_whitespace(&raw),
        width: item.width.filter(|w| w.is_finite()),
    })
}

/// Rendered width of a fragment: the decoder's width when positive,
/// otherwise an estimate from the character count.
pub fn estimate_text_width(fragment: &TextFragment) -> f32 {
    match fragment.width {
        Some(w) if w > 0.0 => w,
        _ => {
            let chars = fragment.text.chars().count() as f32;
            (chars * fragment.font_size * CHAR_WIDTH_RATIO).max(MIN_ESTIMATED_WIDTH)
        }
    }
}

// ---------------------------------------------------------------------------
// Public API: lines
// ---------------------------------------------------------------------------

/// Group the runs of one page into lines, ordered top to bottom.
pub fn build_lines(items: &[RawTextItem]) -> Vec<Line> {
    let mut fragments: Vec<TextFragment> = items.iter().filter_map(fragment_from_item).collect();
    if fragments.is_empty() {
        return Vec::new();
    }

    fragments.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut groups: Vec<(f32, Vec<TextFragment>)> = Vec::new();
    for fragment in fragments {
        let tolerance = (fragment.font_size * LINE_Y_TOLERANCE_RATIO).max(LINE_Y_TOLERANCE_MIN);
        match groups
            .iter_mut()
            .find(|(y, _)| (y - fragment.y).abs() <= tolerance)
        {
            Some((_, members)) => members.push(fragment),
            None => groups.push((fragment.y, vec![fragment])),
        }
    }

    let mut lines: Vec<Line> = groups
        .into_iter()
        .filter_map(|(y, members)| assemble_line(y, members))
        .collect();

    lines.sort_by(|a, b| b.y.total_cmp(&a.y));
    lines
}

/// Join x-ordered fragments into the text of one line.
///
/// A space is inserted when the horizontal gap exceeds the word-gap
/// threshold, unless the text so far ends with a hyphen.
pub fn join_line_text(fragments: &[TextFragment]) -> String {
    let mut result = String::new();

    for (i, fragment) in fragments.iter().enumerate() {
        if result.is_empty() {
            result.push_str(&fragment.text);
            continue;
        }

        let previous = &fragments[i - 1];
        let gap = fragment.x - (previous.x + estimate_text_width(previous));
        let threshold = (previous.font_size * WORD_GAP_RATIO).max(WORD_GAP_MIN);
        if gap > threshold && !result.ends_with('-') {
            result.push(' ');
        }
        result.push_str(&fragment.text);
    }

    sanitize_fragment(&result)
}

/// `1 +` the number of gaps between x-ordered fragments that are wide
/// enough to separate columns.
pub fn estimate_column_count(fragments: &[TextFragment], font_size: f32) -> usize {
    let threshold = (font_size * COLUMN_GAP_RATIO).max(COLUMN_GAP_MIN);
    1 + fragments
        .windows(2)
        .filter(|pair| pair[1].x - (pair[0].x + estimate_text_width(&pair[0])) > threshold)
        .count()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn assemble_line(y: f32, mut fragments: Vec<TextFragment>) -> Option<Line> {
    fragments.sort_by(|a, b| a.x.total_cmp(&b.x));

    let text = join_line_text(&fragments);
    if text.is_empty() {
        return None;
    }

    let first = fragments.first()?;
    let last = fragments.last()?;
    let font_size =
        fragments.iter().map(|f| f.font_size).sum::<f32>() / fragments.len() as f32;

    Some(Line {
        word_count: count_words(&text),
        column_count: estimate_column_count(&fragments, font_size),
        y,
        font_size,
        start_x: first.x,
        end_x: last.x + estimate_text_width(last),
        leading_whitespace: first.leading_whitespace,
        text,
    })
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
