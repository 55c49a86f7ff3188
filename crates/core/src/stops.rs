//! Checkpoints: pauses before lists, tables, code and media.
//!
//! A stop is described by a [`StopEntry`] and deduplicated through its
//! structural [`StopSignature`]. Entries come from three places:
//!
//! ```text
//! boundary_stop   word-stream boundary whose next block is a stop kind
//! initial_stop    first block of a fresh session is a stop kind
//! block_stop      auto-continue walked onto a stop block
//! ```

use serde::Serialize;

use crate::block::{BlockId, BlockKind, BlockRef, StopKind};
use crate::stream::{sanitize_text, SemanticBlock, WordStream};

/// Default preview length in characters.
pub const PREVIEW_MAX_CHARS: usize = 220;
const CODE_PREVIEW_MAX_CHARS: usize = 260;
const TABLE_TEXT_MAX_CHARS: usize = 160;
const LIST_PREVIEW_ITEMS: usize = 3;
/// Items shown on a list checkpoint card.
pub const MAX_LIST_ITEMS: usize = 6;
/// Acknowledged checkpoints kept per session.
pub const MAX_CHECKPOINT_HISTORY: usize = 8;

const MEDIA_FALLBACK_PREVIEW: &str = "Image encountered in document flow.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopSource {
    SemanticBoundary,
    AutoContinue,
}

/// What a stop is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKey {
    /// Boundary after word `word_index`, before stream block `next_block`.
    Boundary { word_index: usize, next_block: usize },
    /// Stop raised when the session opened on a stop block.
    Initial { word_index: usize },
    /// A document block reached by auto-continue.
    Block(BlockId),
}

impl StopKey {
    /// Last word before the stop, when the stop sits inside the stream.
    pub fn word_index(&self) -> Option<usize> {
        match self {
            StopKey::Boundary { word_index, .. } | StopKey::Initial { word_index } => {
                Some(*word_index)
            }
            StopKey::Block(_) => None,
        }
    }
}

/// Dedup key of a stop. Two stops are the same stop iff their signatures
/// are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StopSignature {
    pub source: StopSource,
    pub kind: StopKind,
    pub key: StopKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopEntry<B> {
    pub kind: StopKind,
    pub title: String,
    pub preview_text: String,
    pub list_items: Vec<String>,
    pub anchor: Option<B>,
    /// Stream index of the block the stop precedes, when it is in the stream.
    pub next_block: Option<usize>,
    pub signature: StopSignature,
    pub source: StopSource,
    pub pending: bool,
}

/// An acknowledged stop.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRecord<B> {
    pub entry: StopEntry<B>,
    pub acknowledged_at: u64,
}

// ---------------------------------------------------------------------------
// Public API: builders
// ---------------------------------------------------------------------------

/// Stop for the boundary between stream blocks `current` and `next`, if the
/// next block is a stop kind.
///
/// A list item directly followed by a sibling list item does not stop.
pub fn boundary_stop<B: BlockRef>(
    stream: &WordStream<B>,
    current: usize,
    next: usize,
) -> Option<StopEntry<B>> {
    let current_block = stream.blocks.get(current)?;
    let next_block = stream.blocks.get(next)?;
    let kind = next_block.kind.stop_kind()?;

    if is_sibling_list_item(current_block, next_block) {
        return None;
    }

    let key = StopKey::Boundary {
        word_index: current_block.end,
        next_block: next,
    };
    Some(entry_for_stream_block(next_block, next, kind, key))
}

/// Stop raised at mount when the first stream block is itself a stop kind.
pub fn initial_stop<B: BlockRef>(stream: &WordStream<B>) -> Option<StopEntry<B>> {
    let first = stream.blocks.first()?;
    let kind = first.kind.stop_kind()?;
    let key = StopKey::Initial {
        word_index: first.start,
    };
    Some(entry_for_stream_block(first, 0, kind, key))
}

/// Stop anchored on a document block outside the stream. List items never
/// stop when reached by auto-continue.
pub fn block_stop<B: BlockRef>(block: &B, source: StopSource) -> Option<StopEntry<B>> {
    let block_kind = block.kind();
    let kind = block_kind.stop_kind()?;
    if source == StopSource::AutoContinue && block_kind == BlockKind::ListItem {
        return None;
    }

    Some(StopEntry {
        kind,
        title: checkpoint_title(kind, block_kind),
        preview_text: preview_text(Some(block), "", &[], kind),
        list_items: list_items(Some(block), &[]),
        anchor: Some(block.clone()),
        next_block: None,
        signature: StopSignature {
            source,
            kind,
            key: StopKey::Block(block.id()),
        },
        source,
        pending: false,
    })
}

/// Record an acknowledged stop. A repeat of the last signature is ignored
/// and only the newest [`MAX_CHECKPOINT_HISTORY`] records are kept.
pub fn push_checkpoint<B: Clone>(
    history: &mut Vec<CheckpointRecord<B>>,
    entry: &StopEntry<B>,
    acknowledged_at: u64,
) {
    if history
        .last()
        .is_some_and(|last| last.entry.signature == entry.signature)
    {
        return;
    }

    history.push(CheckpointRecord {
        entry: StopEntry {
            pending: false,
            ..entry.clone()
        },
        acknowledged_at,
    });
    if history.len() > MAX_CHECKPOINT_HISTORY {
        let excess = history.len() - MAX_CHECKPOINT_HISTORY;
        history.drain(..excess);
    }
}

// ---------------------------------------------------------------------------
// Public API: text
// ---------------------------------------------------------------------------

pub fn checkpoint_title(kind: StopKind, anchor_kind: BlockKind) -> String {
    let title = match kind {
        StopKind::Media => "Image Checkpoint",
        StopKind::Table => "Table Checkpoint",
        StopKind::Code => "Code Checkpoint",
        StopKind::List if anchor_kind == BlockKind::ListItem => "List Item Checkpoint",
        StopKind::List => "List Checkpoint",
    };
    title.to_string()
}

/// Sanitize and cut `text` to `max_chars` characters, ending with `…` when
/// shortened.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let text = sanitize_text(text);
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Preview line for a stop card.
pub fn preview_text<B: BlockRef>(
    anchor: Option<&B>,
    fallback: &str,
    fallback_items: &[String],
    kind: StopKind,
) -> String {
    let anchor_text = || {
        anchor
            .map(|a| a.text())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    match kind {
        StopKind::List => {
            let items = match anchor {
                Some(a) if a.kind() == BlockKind::ListItem => {
                    return truncate_preview(&anchor_text(), PREVIEW_MAX_CHARS)
                }
                Some(a) => child_item_texts(a),
                None => sanitized_items(fallback_items),
            };
            if items.is_empty() {
                return truncate_preview(&anchor_text(), PREVIEW_MAX_CHARS);
            }
            let bullets: Vec<String> = items
                .iter()
                .take(LIST_PREVIEW_ITEMS)
                .map(|item| format!("• {}", item))
                .collect();
            truncate_preview(&bullets.join(" "), PREVIEW_MAX_CHARS)
        }
        StopKind::Table => match anchor.filter(|a| a.kind() == BlockKind::Table) {
            Some(table) => table_preview(table),
            None => truncate_preview(&anchor_text(), PREVIEW_MAX_CHARS),
        },
        StopKind::Code => truncate_preview(&anchor_text(), CODE_PREVIEW_MAX_CHARS),
        StopKind::Media => match anchor.filter(|a| a.kind() == BlockKind::Media) {
            Some(media) => {
                let alt = sanitize_text(&media.text());
                if alt.is_empty() {
                    MEDIA_FALLBACK_PREVIEW.to_string()
                } else {
                    truncate_preview(&alt, PREVIEW_MAX_CHARS)
                }
            }
            None => truncate_preview(&anchor_text(), PREVIEW_MAX_CHARS),
        },
    }
}

/// Up to [`MAX_LIST_ITEMS`] item lines for a list card.
pub fn list_items<B: BlockRef>(anchor: Option<&B>, fallback_items: &[String]) -> Vec<String> {
    let items = match anchor {
        Some(a) if a.kind() == BlockKind::ListItem => vec![sanitize_text(&a.text())],
        Some(a) if matches!(a.kind(), BlockKind::List { .. }) => child_item_texts(a),
        Some(_) => Vec::new(),
        None => sanitized_items(fallback_items),
    };
    items
        .into_iter()
        .filter(|item| !item.is_empty())
        .take(MAX_LIST_ITEMS)
        .map(|item| truncate_preview(&item, PREVIEW_MAX_CHARS))
        .collect()
}

/// List stops anchor on the enclosing list of a list item.
pub fn resolve_anchor<B: BlockRef>(block: &B, kind: StopKind) -> B {
    if kind == StopKind::List && block.kind() == BlockKind::ListItem {
        if let Some(parent) = block.parent() {
            if matches!(parent.kind(), BlockKind::List { .. }) {
                return parent;
            }
        }
    }
    block.clone()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn entry_for_stream_block<B: BlockRef>(
    block: &SemanticBlock<B>,
    index: usize,
    kind: StopKind,
    key: StopKey,
) -> StopEntry<B> {
    let anchor = block.source.as_ref().map(|s| resolve_anchor(s, kind));
    let anchor_kind = anchor.as_ref().map(|a| a.kind()).unwrap_or(block.kind);

    StopEntry {
        kind,
        title: checkpoint_title(kind, anchor_kind),
        preview_text: preview_text(anchor.as_ref(), &block.text, &block.items, kind),
        list_items: if kind == StopKind::List {
            list_items(anchor.as_ref(), &block.items)
        } else {
            Vec::new()
        },
        anchor,
        next_block: Some(index),
        signature: StopSignature {
            source: StopSource::SemanticBoundary,
            kind,
            key,
        },
        source: StopSource::SemanticBoundary,
        pending: false,
    }
}

fn is_sibling_list_item<B: BlockRef>(current: &SemanticBlock<B>, next: &SemanticBlock<B>) -> bool {
    if current.kind != BlockKind::ListItem || next.kind != BlockKind::ListItem {
        return false;
    }
    let parent_of = |b: &SemanticBlock<B>| b.source.as_ref().and_then(|s| s.parent()).map(|p| p.id());
    match (parent_of(current), parent_of(next)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn child_item_texts<B: BlockRef>(list: &B) -> Vec<String> {
    list.children()
        .iter()
        .filter(|child| child.kind() == BlockKind::ListItem)
        .map(|child| sanitize_text(&child.text()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn sanitized_items(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| sanitize_text(item))
        .filter(|item| !item.is_empty())
        .collect()
}

fn table_preview<B: BlockRef>(table: &B) -> String {
    let rows: Vec<B> = table
        .children()
        .into_iter()
        .filter(|c| c.kind() == BlockKind::Row)
        .collect();
    let columns = rows.first().map(|r| r.children().len()).unwrap_or(0);
    let summary = if rows.is_empty() {
        "Table checkpoint.".to_string()
    } else {
        format!("{} rows × {} columns.", rows.len(), columns)
    };

    let text = sanitize_text(&table.text());
    if text.is_empty() {
        return summary;
    }
    format!("{} {}", summary, truncate_preview(&text, TABLE_TEXT_MAX_CHARS))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::tree::{DocBlock, DocumentTree, TreeBuilder};

    fn tree_with(build: impl FnOnce(&mut TreeBuilder)) -> Rc<DocumentTree> {
        let mut b = TreeBuilder::new();
        build(&mut b);
        b.build()
    }

    fn stream_of(tree: &Rc<DocumentTree>, ids: &[u64]) -> WordStream<DocBlock> {
        WordStream::from_blocks(ids.iter().map(|&i| tree.block(BlockId(i)).unwrap()))
    }

    fn entry(kind: StopKind, key: StopKey) -> StopEntry<DocBlock> {
        StopEntry {
            kind,
            title: String::new(),
            preview_text: String::new(),
            list_items: Vec::new(),
            anchor: None,
            next_block: None,
            signature: StopSignature {
                source: StopSource::SemanticBoundary,
                kind,
                key,
            },
            source: StopSource::SemanticBoundary,
            pending: true,
        }
    }

    // ====================================================================
    // Boundary stops
    // ====================================================================

    #[test]
    fn test_boundary_before_list_anchors_on_list() {
        let tree = tree_with(|b| {
            b.leaf(BlockKind::Paragraph, "Before the list");
            b.open(BlockKind::List { ordered: false }, "");
            b.leaf(BlockKind::ListItem, "first");
            b.leaf(BlockKind::ListItem, "second");
            b.close();
        });
        let stream = stream_of(&tree, &[0, 2, 3]);

        let stop = boundary_stop(&stream, 0, 1).unwrap();
        assert_eq!(stop.kind, StopKind::List);
        assert_eq!(stop.title, "List Checkpoint");
        assert_eq!(stop.anchor.as_ref().map(|a| a.id()), Some(BlockId(1)));
        assert_eq!(stop.preview_text, "• first • second");
        assert_eq!(stop.list_items, vec!["first", "second"]);
        assert_eq!(
            stop.signature.key,
            StopKey::Boundary {
                word_index: 2,
                next_block: 1
            }
        );
    }

    #[test]
    fn test_sibling_list_items_do_not_stop() {
        let tree = tree_with(|b| {
            b.open(BlockKind::List { ordered: false }, "");
            b.leaf(BlockKind::ListItem, "first");
            b.leaf(BlockKind::ListItem, "second");
            b.close();
        });
        let stream = stream_of(&tree, &[1, 2]);
        assert!(boundary_stop(&stream, 0, 1).is_none());
    }

    #[test]
    fn test_paragraph_boundary_is_not_a_stop() {
        let tree = tree_with(|b| {
            b.leaf(BlockKind::Paragraph, "one");
            b.leaf(BlockKind::Paragraph, "two");
        });
        let stream = stream_of(&tree, &[0, 1]);
        assert!(boundary_stop(&stream, 0, 1).is_none());
    }

    #[test]
    fn test_initial_stop_for_leading_table() {
        let tree = tree_with(|b| {
            b.open(BlockKind::Table, "");
            b.open(BlockKind::Row, "");
            b.leaf(BlockKind::Cell, "a");
            b.leaf(BlockKind::Cell, "b");
            b.close();
            b.close();
            b.leaf(BlockKind::Paragraph, "after");
        });
        let stream = stream_of(&tree, &[0, 4]);
        let stop = initial_stop(&stream).unwrap();
        assert_eq!(stop.kind, StopKind::Table);
        assert_eq!(stop.signature.key, StopKey::Initial { word_index: 0 });
        assert_eq!(stop.preview_text, "1 rows × 2 columns. a b");
        assert_eq!(stop.next_block, Some(0));
    }

    #[test]
    fn test_no_initial_stop_for_paragraph() {
        let tree = tree_with(|b| {
            b.leaf(BlockKind::Paragraph, "plain");
        });
        assert!(initial_stop(&stream_of(&tree, &[0])).is_none());
    }

    // ====================================================================
    // Block stops
    // ====================================================================

    #[test]
    fn test_media_block_stop_uses_alt_text() {
        let tree = tree_with(|b| {
            b.leaf(BlockKind::Media, "A chart of results");
            b.leaf(BlockKind::Media, "");
        });
        let with_alt = block_stop(&tree.block(BlockId(0)).unwrap(), StopSource::AutoContinue).unwrap();
        assert_eq!(with_alt.title, "Image Checkpoint");
        assert_eq!(with_alt.preview_text, "A chart of results");
        assert_eq!(with_alt.signature.key, StopKey::Block(BlockId(0)));

        let without = block_stop(&tree.block(BlockId(1)).unwrap(), StopSource::AutoContinue).unwrap();
        assert_eq!(without.preview_text, "Image encountered in document flow.");
    }

    #[test]
    fn test_auto_continue_list_item_is_not_a_stop() {
        let tree = tree_with(|b| {
            b.open(BlockKind::List { ordered: true }, "");
            b.leaf(BlockKind::ListItem, "x");
            b.close();
        });
        let item = tree.block(BlockId(1)).unwrap();
        assert!(block_stop(&item, StopSource::AutoContinue).is_none());
        let stop = block_stop(&item, StopSource::SemanticBoundary).unwrap();
        assert_eq!(stop.title, "List Item Checkpoint");
    }

    #[test]
    fn test_code_preview_is_longer() {
        let long = "x".repeat(400);
        let tree = tree_with(|b| {
            b.leaf(BlockKind::Code, long.as_str());
        });
        let stop = block_stop(&tree.block(BlockId(0)).unwrap(), StopSource::AutoContinue).unwrap();
        assert_eq!(stop.preview_text.chars().count(), 260);
        assert!(stop.preview_text.ends_with('…'));
    }

    // ====================================================================
    // Text helpers
    // ====================================================================

    #[test]
    fn test_truncate_preview() {
        assert_eq!(truncate_preview("  short   text ", 220), "short text");
        assert_eq!(truncate_preview("abcdef", 4), "abc…");
        assert_eq!(truncate_preview("", 10), "");
    }

    #[test]
    fn test_list_items_cap_at_six() {
        let items: Vec<String> = (0..10).map(|i| format!("item {}", i)).collect();
        let shown = list_items::<DocBlock>(None, &items);
        assert_eq!(shown.len(), 6);
        assert_eq!(shown[5], "item 5");
    }

    // ====================================================================
    // History
    // ====================================================================

    #[test]
    fn test_history_skips_repeat_of_last_signature() {
        let mut history = Vec::new();
        let a = entry(StopKind::List, StopKey::Initial { word_index: 0 });
        push_checkpoint(&mut history, &a, 10);
        push_checkpoint(&mut history, &a, 20);
        assert_eq!(history.len(), 1);
        assert!(!history[0].entry.pending, "records are never pending");
        assert_eq!(history[0].acknowledged_at, 10);
    }

    #[test]
    fn test_history_keeps_newest_eight() {
        let mut history = Vec::new();
        for i in 0..12 {
            let e = entry(StopKind::Media, StopKey::Block(BlockId(i)));
            push_checkpoint(&mut history, &e, i);
        }
        assert_eq!(history.len(), MAX_CHECKPOINT_HISTORY);
        assert_eq!(history[0].acknowledged_at, 4);
        assert_eq!(history[7].acknowledged_at, 11);
    }
}
