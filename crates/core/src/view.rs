//! View models of a reading session.
//!
//! Everything here is a pure function of [`ReadingSession`]. A renderer
//! builds a [`RenderSignature`] after each mutation and redraws only when
//! [`FrameCache::should_render`] says it changed.

use serde::Serialize;

use crate::block::{BlockKind, BlockRef, SemanticType, StopKind};
use crate::reader::ReadingSession;
use crate::stops::{truncate_preview, StopEntry};

/// CSS class of the highlighted pivot character.
pub const PIVOT_CLASS: &str = "engram-pivot";
pub const HEADER_STOP_NOTE: &str = "Next Chapter, press Enter to continue";
/// Consumed blocks kept in the upward stream.
pub const MAX_STREAM_HISTORY: usize = 14;

const CARD_TABLE_MAX_ROWS: usize = 6;
const CARD_TABLE_MAX_COLS: usize = 6;
const CARD_CELL_MAX_CHARS: usize = 90;
const CARD_CODE_MAX_CHARS: usize = 1200;

// ---------------------------------------------------------------------------
// ORP
// ---------------------------------------------------------------------------

/// Pivot position for a word of `len` characters.
pub fn pivot_index(len: usize) -> usize {
    let pivot = match len {
        0 | 1 => 0,
        2..=5 => 1,
        6..=9 => 2,
        10..=13 => 3,
        _ => 4,
    };
    pivot.min(len.saturating_sub(1))
}

/// Split a word around its pivot character.
pub fn split_pivot(word: &str) -> (String, String, String) {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return (String::new(), String::new(), String::new());
    }
    let pivot = pivot_index(chars.len());
    (
        chars[..pivot].iter().collect(),
        chars[pivot].to_string(),
        chars[pivot + 1..].iter().collect(),
    )
}

/// HTML for a word with its pivot wrapped in a [`PIVOT_CLASS`] span.
pub fn orp_markup(word: &str) -> String {
    if word.is_empty() {
        return "&nbsp;".to_string();
    }
    let (before, pivot, after) = split_pivot(word);
    format!(
        "{}<span class=\"{}\">{}</span>{}",
        html_escape::encode_text(&before),
        PIVOT_CLASS,
        html_escape::encode_text(&pivot),
        html_escape::encode_text(&after)
    )
}

/// Font size for a header preview; longer headers render smaller.
pub fn header_preview_font_size(text: &str) -> u32 {
    match text.chars().count() {
        0..=24 => 60,
        25..=48 => 52,
        49..=72 => 46,
        73..=110 => 40,
        111..=160 => 34,
        _ => 30,
    }
}

// ---------------------------------------------------------------------------
// Word display
// ---------------------------------------------------------------------------

/// What a checkpoint card shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StopCard {
    pub kind: StopKind,
    pub title: String,
    pub note: String,
    pub preview_text: String,
    pub list_items: Vec<String>,
    /// Leading rows and cells of a table anchor.
    pub table_rows: Vec<Vec<String>>,
    /// Code text of a code anchor.
    pub code: Option<String>,
}

impl StopCard {
    pub fn from_entry<B: BlockRef>(entry: &StopEntry<B>) -> Self {
        let anchor = entry.anchor.as_ref();
        let table_rows = match anchor {
            Some(table) if entry.kind == StopKind::Table && table.kind() == BlockKind::Table => {
                table_grid(table)
            }
            _ => Vec::new(),
        };
        let code = (entry.kind == StopKind::Code).then(|| {
            let source = anchor
                .map(|a| a.text())
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| entry.preview_text.clone());
            let text = truncate_preview(&source, CARD_CODE_MAX_CHARS);
            if text.is_empty() {
                "Code checkpoint.".to_string()
            } else {
                text
            }
        });

        StopCard {
            kind: entry.kind,
            title: entry.title.clone(),
            note: format!("{} • Press Enter to continue", entry.title),
            preview_text: entry.preview_text.clone(),
            list_items: entry.list_items.clone(),
            table_rows,
            code,
        }
    }
}

fn table_grid<B: BlockRef>(table: &B) -> Vec<Vec<String>> {
    table
        .children()
        .into_iter()
        .filter(|row| row.kind() == BlockKind::Row)
        .take(CARD_TABLE_MAX_ROWS)
        .map(|row| {
            row.children()
                .into_iter()
                .take(CARD_TABLE_MAX_COLS)
                .map(|cell| truncate_preview(&cell.text(), CARD_CELL_MAX_CHARS))
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "display", rename_all = "snake_case")]
pub enum WordDisplay {
    Word {
        markup: String,
    },
    HeaderStop {
        header_text: String,
        font_size_px: u32,
        markup: String,
    },
    Checkpoint(StopCard),
    Empty,
}

pub fn word_display<B: BlockRef>(session: &ReadingSession<B>) -> WordDisplay {
    if let Some(header) = session.header_stop_text() {
        let font_size_px = header_preview_font_size(header);
        let markup = format!(
            "<div class=\"engram-header-stop\" style=\"font-size:{}px\">{}</div>\
             <div class=\"engram-stop-note\">{}</div>",
            font_size_px,
            html_escape::encode_text(header),
            HEADER_STOP_NOTE
        );
        return WordDisplay::HeaderStop {
            header_text: header.to_string(),
            font_size_px,
            markup,
        };
    }

    if session.is_checkpoint_active() {
        if let Some(stop) = session.pending_stop.as_ref() {
            return WordDisplay::Checkpoint(StopCard::from_entry(stop));
        }
    }

    match session.current_word() {
        Some(word) => WordDisplay::Word {
            markup: orp_markup(word),
        },
        None => WordDisplay::Empty,
    }
}

// ---------------------------------------------------------------------------
// Progress and controls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.current, self.total)
    }
}

/// Word progress. Once auto-continue has appended blocks the counter shows
/// the original stream as finished.
pub fn progress<B>(session: &ReadingSession<B>) -> Progress {
    if session.settings.auto_continue && session.auto_continue_started {
        let total = session.initial_word_count.max(1);
        return Progress {
            current: total,
            total,
        };
    }

    let total = session.stream.len();
    let current = if total == 0 {
        0
    } else {
        (session.current_index + 1).min(total)
    };
    Progress { current, total }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Controls {
    pub is_playing: bool,
    pub stop_active: bool,
    pub label: &'static str,
}

pub fn controls<B: BlockRef>(session: &ReadingSession<B>) -> Controls {
    let stop_active = session.is_stop_active();
    let label = if stop_active {
        "Enter ↵"
    } else if session.is_playing {
        "Pause"
    } else {
        "Play"
    };
    Controls {
        is_playing: session.is_playing,
        stop_active,
        label,
    }
}

// ---------------------------------------------------------------------------
// Upward stream
// ---------------------------------------------------------------------------

/// The block being read, split at the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CurrentBlock {
    pub label: String,
    pub read_text: String,
    pub remaining_text: String,
    pub read_words: usize,
    pub total_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StreamEntry {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CheckpointEntry {
    pub kind: StopKind,
    pub title: String,
    pub preview_text: String,
    pub pending: bool,
    pub acknowledged_at: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct UpwardStream {
    pub current: Option<CurrentBlock>,
    /// Consumed blocks, oldest first.
    pub history: Vec<StreamEntry>,
    pub checkpoints: Vec<CheckpointEntry>,
}

/// "Header (H2)" or "Text (P)".
pub fn block_label(kind: BlockKind) -> String {
    let role = match kind.semantic_type() {
        SemanticType::Header => "Header",
        SemanticType::Paragraph => "Text",
    };
    format!("{} ({})", role, kind.tag())
}

pub fn upward_stream<B: BlockRef>(session: &ReadingSession<B>) -> UpwardStream {
    let index = session.current_index;
    let stream = &session.stream;

    let current = stream
        .block_at(index)
        .map(|i| &stream.blocks[i])
        .filter(|block| !block.is_list())
        .map(|block| {
            let words = &stream.words[block.start..=block.end];
            let read = (index + 1).saturating_sub(block.start).min(words.len());
            CurrentBlock {
                label: block_label(block.kind),
                read_text: words[..read].join(" "),
                remaining_text: words[read..].join(" "),
                read_words: read,
                total_words: words.len(),
            }
        });

    let consumed: Vec<StreamEntry> = stream
        .blocks
        .iter()
        .filter(|block| block.end < index && !block.is_list())
        .map(|block| StreamEntry {
            label: block_label(block.kind),
            text: block.text.clone(),
        })
        .collect();
    let skip = consumed.len().saturating_sub(MAX_STREAM_HISTORY);
    let history = consumed.into_iter().skip(skip).collect();

    let mut checkpoints: Vec<CheckpointEntry> = session
        .checkpoint_history
        .iter()
        .map(|record| CheckpointEntry {
            kind: record.entry.kind,
            title: record.entry.title.clone(),
            preview_text: record.entry.preview_text.clone(),
            pending: false,
            acknowledged_at: Some(record.acknowledged_at),
        })
        .collect();
    if let Some(stop) = session.pending_stop.as_ref() {
        checkpoints.push(CheckpointEntry {
            kind: stop.kind,
            title: stop.title.clone(),
            preview_text: stop.preview_text.clone(),
            pending: true,
            acknowledged_at: None,
        });
    }

    UpwardStream {
        current,
        history,
        checkpoints,
    }
}

// ---------------------------------------------------------------------------
// Render diffing
// ---------------------------------------------------------------------------

/// Everything a renderer shows for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RenderSignature {
    pub display: WordDisplay,
    pub progress: Progress,
    pub controls: Controls,
    pub stream: UpwardStream,
}

pub fn render_signature<B: BlockRef>(session: &ReadingSession<B>) -> RenderSignature {
    RenderSignature {
        display: word_display(session),
        progress: progress(session),
        controls: controls(session),
        stream: upward_stream(session),
    }
}

/// Remembers the last rendered signature.
#[derive(Debug, Default)]
pub struct FrameCache {
    last: Option<RenderSignature>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when `signature` differs from the last rendered one, which it
    /// then replaces.
    pub fn should_render(&mut self, signature: &RenderSignature) -> bool {
        if self.last.as_ref() == Some(signature) {
            return false;
        }
        self.last = Some(signature.clone());
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::stops::{block_stop, push_checkpoint, StopSource};
    use crate::stream::WordStream;
    use crate::tree::{DocBlock, TreeBuilder};

    fn session(blocks: &[(BlockKind, &str)]) -> ReadingSession<DocBlock> {
        let mut stream = WordStream::new();
        for (kind, text) in blocks {
            stream.push_text(*kind, text, Vec::new(), None);
        }
        ReadingSession::new(stream, Settings::default())
    }

    // ====================================================================
    // ORP
    // ====================================================================

    #[test]
    fn test_pivot_index_by_length() {
        assert_eq!(pivot_index(0), 0);
        assert_eq!(pivot_index(1), 0);
        assert_eq!(pivot_index(5), 1);
        assert_eq!(pivot_index(9), 2);
        assert_eq!(pivot_index(13), 3);
        assert_eq!(pivot_index(20), 4);
    }

    #[test]
    fn test_orp_markup() {
        assert_eq!(
            orp_markup("reading"),
            "re<span class=\"engram-pivot\">a</span>ding"
        );
        assert_eq!(orp_markup("a"), "<span class=\"engram-pivot\">a</span>");
        assert_eq!(orp_markup(""), "&nbsp;");
    }

    #[test]
    fn test_orp_markup_escapes() {
        assert_eq!(
            orp_markup("<a&b>"),
            "&lt;<span class=\"engram-pivot\">a</span>&amp;b&gt;"
        );
    }

    #[test]
    fn test_split_pivot_is_char_based() {
        assert_eq!(
            split_pivot("héllo"),
            ("h".to_string(), "é".to_string(), "llo".to_string())
        );
    }

    #[test]
    fn test_header_font_sizes() {
        assert_eq!(header_preview_font_size("Short"), 60);
        assert_eq!(header_preview_font_size(&"x".repeat(48)), 52);
        assert_eq!(header_preview_font_size(&"x".repeat(72)), 46);
        assert_eq!(header_preview_font_size(&"x".repeat(110)), 40);
        assert_eq!(header_preview_font_size(&"x".repeat(160)), 34);
        assert_eq!(header_preview_font_size(&"x".repeat(161)), 30);
    }

    // ====================================================================
    // Word display
    // ====================================================================

    #[test]
    fn test_display_word_then_header_stop() {
        let mut s = session(&[
            (BlockKind::Paragraph, "one two"),
            (BlockKind::heading(2), "Chapter <2>"),
        ]);
        assert!(matches!(word_display(&s), WordDisplay::Word { .. }));

        s.current_index = 1;
        s.is_playing = false;
        s.blocked_header = Some(1);
        match word_display(&s) {
            WordDisplay::HeaderStop {
                header_text,
                font_size_px,
                markup,
            } => {
                assert_eq!(header_text, "Chapter <2>");
                assert_eq!(font_size_px, 60);
                assert!(markup.contains("Chapter &lt;2&gt;"));
                assert!(markup.contains(HEADER_STOP_NOTE));
            }
            other => panic!("expected header stop, got {:?}", other),
        }
    }

    #[test]
    fn test_checkpoint_card_for_table() {
        let mut b = TreeBuilder::new();
        b.open(BlockKind::Table, "");
        for row in [["a", "b"], ["c", "d"]] {
            b.open(BlockKind::Row, "");
            for cell in row {
                b.leaf(BlockKind::Cell, cell);
            }
            b.close();
        }
        b.close();
        let tree = b.build();
        let table = tree.block(crate::block::BlockId(0)).unwrap();

        let mut s = session(&[(BlockKind::Paragraph, "before")]);
        s.pending_stop = block_stop(&table, StopSource::AutoContinue);
        s.is_playing = false;

        match word_display(&s) {
            WordDisplay::Checkpoint(card) => {
                assert_eq!(card.title, "Table Checkpoint");
                assert_eq!(card.note, "Table Checkpoint • Press Enter to continue");
                assert_eq!(card.table_rows, vec![vec!["a", "b"], vec!["c", "d"]]);
                assert_eq!(card.code, None);
            }
            other => panic!("expected checkpoint, got {:?}", other),
        }
    }

    // ====================================================================
    // Progress and controls
    // ====================================================================

    #[test]
    fn test_progress_counts_from_one() {
        let mut s = session(&[(BlockKind::Paragraph, "a b c")]);
        assert_eq!(progress(&s).to_string(), "1 / 3");
        s.current_index = 2;
        assert_eq!(progress(&s), Progress { current: 3, total: 3 });

        let empty = session(&[]);
        assert_eq!(progress(&empty), Progress { current: 0, total: 0 });
    }

    #[test]
    fn test_progress_frozen_after_auto_continue() {
        let mut s = session(&[(BlockKind::Paragraph, "a b")]);
        s.settings.auto_continue = true;
        s.auto_continue_started = true;
        s.stream.push_text(BlockKind::Paragraph, "c d e", Vec::new(), None);
        s.current_index = 3;
        assert_eq!(progress(&s).to_string(), "2 / 2");
    }

    #[test]
    fn test_control_labels() {
        let mut s = session(&[(BlockKind::Paragraph, "a"), (BlockKind::Code, "x")]);
        assert_eq!(controls(&s).label, "Pause");
        s.is_playing = false;
        assert_eq!(controls(&s).label, "Play");
        s.pending_stop = crate::stops::boundary_stop(&s.stream, 0, 1);
        let c = controls(&s);
        assert_eq!(c.label, "Enter ↵");
        assert!(c.stop_active);
    }

    // ====================================================================
    // Upward stream
    // ====================================================================

    #[test]
    fn test_current_block_split_at_cursor() {
        let mut s = session(&[
            (BlockKind::heading(2), "Title"),
            (BlockKind::Paragraph, "one two three four"),
        ]);
        s.current_index = 2;
        let view = upward_stream(&s);
        let current = view.current.unwrap();
        assert_eq!(current.label, "Text (P)");
        assert_eq!(current.read_text, "one two");
        assert_eq!(current.remaining_text, "three four");
        assert_eq!((current.read_words, current.total_words), (2, 4));
        assert_eq!(
            view.history,
            vec![StreamEntry {
                label: "Header (H2)".into(),
                text: "Title".into()
            }]
        );
    }

    #[test]
    fn test_list_blocks_are_left_out() {
        let mut s = session(&[]);
        s.stream.push_text(
            BlockKind::List { ordered: false },
            "",
            vec!["x".into(), "y".into()],
            None,
        );
        s.stream.push_text(BlockKind::Paragraph, "after", Vec::new(), None);
        assert!(upward_stream(&s).current.is_none());
        s.current_index = 2;
        assert!(upward_stream(&s).history.is_empty());
    }

    #[test]
    fn test_history_keeps_last_fourteen() {
        let blocks: Vec<(BlockKind, String)> = (0..20)
            .map(|i| (BlockKind::Paragraph, format!("p{}", i)))
            .collect();
        let refs: Vec<(BlockKind, &str)> = blocks.iter().map(|(k, t)| (*k, t.as_str())).collect();
        let mut s = session(&refs);
        s.current_index = 19;
        let history = upward_stream(&s).history;
        assert_eq!(history.len(), MAX_STREAM_HISTORY);
        assert_eq!(history[0].text, "p5");
    }

    #[test]
    fn test_checkpoints_include_pending_last() {
        let mut s = session(&[(BlockKind::Paragraph, "a"), (BlockKind::Media, "fig")]);
        let stop = crate::stops::boundary_stop(&s.stream, 0, 1).unwrap();
        push_checkpoint(&mut s.checkpoint_history, &stop, 42);
        s.pending_stop = Some(stop);

        let entries = upward_stream(&s).checkpoints;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].acknowledged_at, Some(42));
        assert!(!entries[0].pending);
        assert!(entries[1].pending);
    }

    #[test]
    fn test_display_serializes_with_tag() {
        let s = session(&[(BlockKind::Paragraph, "go")]);
        let value = serde_json::to_value(word_display(&s)).unwrap();
        assert_eq!(value["display"], "word");
        assert_eq!(
            value["markup"],
            "g<span class=\"engram-pivot\">o</span>"
        );
    }

    // ====================================================================
    // Render diffing
    // ====================================================================

    #[test]
    fn test_frame_cache_skips_identical_frames() {
        let mut s = session(&[(BlockKind::Paragraph, "a b")]);
        let mut cache = FrameCache::new();
        assert!(cache.should_render(&render_signature(&s)));
        assert!(!cache.should_render(&render_signature(&s)));

        s.current_index = 1;
        assert!(cache.should_render(&render_signature(&s)));

        cache.reset();
        assert!(cache.should_render(&render_signature(&s)));
    }
}
