//! Block grouping and cross-page merging.
//!
//! ```text
//! Line[] (per page)  ->  PageBlock[] (per page)  ->  Page[] (merged)
//!                        build_website_blocks        merge_page_continuations
//!                        build_semantic_blocks
//! ```

use super::classify::{
    classify_line, is_heading_bucket, is_list_line, list_item_text,
};
use crate::render::cleanup::{ends_with_hyphen, join_flowing_text, sanitize_fragment};
use crate::types::{BlockType, Line, Page, PageBlock, PageStats};

/// Minimum indentation (points) of a list continuation line past the
/// marker: `max(LIST_INDENT_MIN, font_size * LIST_INDENT_RATIO)`.
const LIST_INDENT_MIN: f32 = 4.0;
const LIST_INDENT_RATIO: f32 = 0.45;

// ---------------------------------------------------------------------------
// Semantic grouping (per-page statistics)
// ---------------------------------------------------------------------------

/// Group classified lines of one page into blocks.
///
/// Paragraph lines are buffered and joined with spaces. Consecutive list
/// lines form one list whose items are the marker-stripped lines.
/// Consecutive table lines are joined with newlines. Every heading line is
/// its own block.
pub fn build_semantic_blocks(lines: &[Line], stats: &PageStats) -> Vec<PageBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut grouped: Option<(BlockType, Vec<&str>)> = None;

    for line in lines {
        let kind = classify_line(line, stats);

        if kind == BlockType::Paragraph {
            flush_grouped(&mut grouped, &mut blocks);
            paragraph.push(&line.text);
            continue;
        }

        flush_paragraph(&mut paragraph, &mut blocks);

        match grouped.as_mut() {
            Some((current, members)) if *current == kind && kind != BlockType::Heading => {
                members.push(&line.text);
            }
            _ => {
                flush_grouped(&mut grouped, &mut blocks);
                grouped = Some((kind, vec![&line.text]));
            }
        }
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    flush_grouped(&mut grouped, &mut blocks);
    blocks
}

fn flush_paragraph(buffer: &mut Vec<&str>, blocks: &mut Vec<PageBlock>) {
    if buffer.is_empty() {
        return;
    }
    blocks.push(PageBlock::paragraph(buffer.join(" ")));
    buffer.clear();
}

fn flush_grouped(grouped: &mut Option<(BlockType, Vec<&str>)>, blocks: &mut Vec<PageBlock>) {
    let Some((kind, members)) = grouped.take() else {
        return;
    };
    if members.is_empty() {
        return;
    }
    let block = match kind {
        BlockType::List => PageBlock::list(members.iter().map(|t| list_item_text(t)).collect()),
        _ => PageBlock::text(kind, members.join("\n")),
    };
    blocks.push(block);
}

// ---------------------------------------------------------------------------
// Website grouping (document-wide dominant font)
// ---------------------------------------------------------------------------

/// Where the open list item started, used by the continuation test.
#[derive(Debug, Clone, PartialEq)]
struct ListContext {
    marker_start_x: f32,
    continuation_min_x: f32,
    last_line_ended_hyphen: bool,
}

impl ListContext {
    fn for_marker_line(line: &Line, item_text: &str) -> Self {
        let start = if line.start_x.is_finite() {
            line.start_x
        } else {
            0.0
        };
        let font_size = if line.font_size.is_finite() && line.font_size > 0.0 {
            line.font_size
        } else {
            11.0
        };
        ListContext {
            marker_start_x: start,
            continuation_min_x: start + (font_size * LIST_INDENT_RATIO).max(LIST_INDENT_MIN),
            last_line_ended_hyphen: ends_with_hyphen(item_text),
        }
    }

    /// A plain line continues the open item when it is indented past the
    /// marker, carries leading whitespace, or follows a hyphenated line.
    fn continues_with(&self, line: &Line) -> bool {
        let indented = line.start_x.is_finite() && line.start_x >= self.continuation_min_x;
        indented || line.leading_whitespace > 0 || self.last_line_ended_hyphen
    }
}

/// Group the lines of one page against the document's dominant font size.
///
/// List markers take priority over the font test. A non-list, non-heading
/// line that passes the continuation test is appended to the last open list
/// item; anything else closes the list and joins the paragraph buffer.
pub fn build_website_blocks(lines: &[Line], dominant_font_size: f32) -> Vec<PageBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();
    let mut context: Option<ListContext> = None;

    for line in lines {
        let text = sanitize_fragment(&line.text);
        if text.is_empty() {
            continue;
        }

        if is_list_line(&text) {
            flush_website_paragraph(&mut paragraph, &mut blocks);
            let item = list_item_text(&text);
            context = Some(ListContext::for_marker_line(line, &item));
            items.push(item);
            continue;
        }

        if is_heading_bucket(line.font_size, dominant_font_size) {
            flush_website_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut items, &mut context, &mut blocks);
            blocks.push(PageBlock::heading(text));
            continue;
        }

        if let (Some(ctx), Some(last)) = (context.as_mut(), items.last_mut()) {
            if ctx.continues_with(line) {
                *last = join_flowing_text(last, &text);
                ctx.last_line_ended_hyphen = ends_with_hyphen(&text);
                continue;
            }
        }

        flush_list(&mut items, &mut context, &mut blocks);
        paragraph.push(text);
    }

    flush_website_paragraph(&mut paragraph, &mut blocks);
    flush_list(&mut items, &mut context, &mut blocks);
    blocks
}

fn flush_website_paragraph(buffer: &mut Vec<String>, blocks: &mut Vec<PageBlock>) {
    if buffer.is_empty() {
        return;
    }
    blocks.push(PageBlock::paragraph(buffer.join(" ")));
    buffer.clear();
}

fn flush_list(
    items: &mut Vec<String>,
    context: &mut Option<ListContext>,
    blocks: &mut Vec<PageBlock>,
) {
    *context = None;
    if items.is_empty() {
        return;
    }
    blocks.push(PageBlock::list(std::mem::take(items)));
}

// ---------------------------------------------------------------------------
// Cross-page merging
// ---------------------------------------------------------------------------

/// Merge blocks that flow across page boundaries.
///
/// While the last block of the previous page and the first block of the
/// next page are both paragraphs or both lists, they are merged (items
/// concatenated, text joined as flowing text). A list followed by a
/// paragraph that reads as a continuation is folded into the last item.
/// Pages left without blocks are dropped.
pub fn merge_page_continuations(pages: Vec<Page>) -> Vec<Page> {
    let mut merged: Vec<Page> = Vec::with_capacity(pages.len());

    for mut page in pages {
        if let Some(previous) = merged.last_mut() {
            absorb_leading_blocks(previous, &mut page);
        }
        merged.push(page);
    }

    merged.retain(|page| !page.blocks.is_empty());
    merged
}

/// Fold the leading blocks of `next` into the trailing block of `previous`
/// for as long as they continue it.
fn absorb_leading_blocks(previous: &mut Page, next: &mut Page) {
    let mut consumed = 0;

    while let (Some(tail), Some(head)) = (previous.blocks.last_mut(), next.blocks.get(consumed)) {
        if should_merge_blocks(tail, head) {
            if tail.kind == BlockType::List {
                tail.items.extend(head.items.iter().cloned());
                tail.sync_list_text();
            } else {
                tail.text = join_flowing_text(&tail.text, &head.text);
            }
        } else if should_merge_list_paragraph(tail, head) {
            if let Some(last) = tail.items.last_mut() {
                *last = join_flowing_text(last, &head.text);
            }
            tail.sync_list_text();
        } else {
            break;
        }
        consumed += 1;
    }

    next.blocks.drain(..consumed);
}

/// Same-type paragraph or list blocks always merge.
pub fn should_merge_blocks(previous: &PageBlock, current: &PageBlock) -> bool {
    previous.kind == current.kind
        && matches!(previous.kind, BlockType::Paragraph | BlockType::List)
}

/// A paragraph continues the last item of a preceding list when that item
/// ends with a hyphen, or the paragraph starts in lowercase, with an open
/// parenthesis or with closing punctuation.
pub fn should_merge_list_paragraph(previous: &PageBlock, current: &PageBlock) -> bool {
    if previous.kind != BlockType::List || current.kind != BlockType::Paragraph {
        return false;
    }

    let paragraph = sanitize_fragment(&current.text);
    let Some(first) = paragraph.chars().next() else {
        return false;
    };

    let last_item = previous
        .items
        .last()
        .map(|item| sanitize_fragment(item))
        .unwrap_or_default();
    if last_item.is_empty() {
        return false;
    }

    if ends_with_hyphen(&last_item) {
        return true;
    }

    first.is_ascii_lowercase() || matches!(first, '(' | ',' | '.' | ';' | ':' | ')' | ']')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
