use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A positioned text run as produced by a content-stream decoder.
///
/// `transform` is the `[a, b, c, d, e, f]` matrix that maps glyph space to
/// page space, already scaled by the font size. `e`/`f` are the baseline
/// origin of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTextItem {
    pub text: String,
    pub transform: [f32; 6],
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// A sanitized, finite text fragment ready for line building.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// Leading whitespace characters in the raw (unsanitized) run.
    pub leading_whitespace: usize,
    pub width: Option<f32>,
}

/// A horizontal line of text assembled from fragments that share
/// (approximately) the same baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub y: f32,
    pub font_size: f32,
    pub column_count: usize,
    pub word_count: usize,
    pub start_x: f32,
    pub end_x: f32,
    pub leading_whitespace: usize,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            text: String::new(),
            y: 0.0,
            font_size: 11.0,
            column_count: 1,
            word_count: 0,
            start_x: 0.0,
            end_x: 0.0,
            leading_whitespace: 0,
        }
    }
}

/// Per-page font statistics used by the semantic classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStats {
    pub median_font_size: f32,
}

impl Default for PageStats {
    fn default() -> Self {
        Self {
            median_font_size: 11.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The semantic type assigned to a line or a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Heading,
    Paragraph,
    List,
    Table,
}

impl BlockType {
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Heading => "Heading",
            BlockType::Paragraph => "Paragraph",
            BlockType::List => "List",
            BlockType::Table => "Table",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How lines are turned into blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Document-wide dominant font baseline with list continuation and
    /// cross-page merging.
    #[default]
    Website,
    /// Per-page median font baseline with table detection.
    Semantic,
}

impl std::str::FromStr for ExtractionMode {
    type Err = InvalidExtractionMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "website" => Ok(ExtractionMode::Website),
            "semantic" => Ok(ExtractionMode::Semantic),
            _ => Err(InvalidExtractionMode(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown extraction mode: {0}")]
pub struct InvalidExtractionMode(pub String);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A typed block of text. List blocks keep their items; `text` is then the
/// space-joined item text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    pub kind: BlockType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl PageBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::text(BlockType::Heading, text)
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text(BlockType::Paragraph, text)
    }

    pub fn text(kind: BlockType, text: impl Into<String>) -> Self {
        PageBlock {
            kind,
            text: text.into(),
            items: Vec::new(),
        }
    }

    pub fn list(items: Vec<String>) -> Self {
        PageBlock {
            kind: BlockType::List,
            text: items.join(" "),
            items,
        }
    }

    /// Recompute `text` after the items of a list block changed.
    pub(crate) fn sync_list_text(&mut self) {
        if self.kind == BlockType::List {
            self.text = self.items.join(" ");
        }
    }
}

/// The blocks extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number in the source document.
    pub number: usize,
    pub blocks: Vec<PageBlock>,
}

/// All pages of a document after classification and grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub mode: ExtractionMode,
    pub dominant_font_size: f32,
    pub pages: Vec<Page>,
}

impl ExtractedDocument {
    /// Iterate every block in reading order with its page number.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &PageBlock)> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(move |b| (page.number, b)))
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_mode_from_str() {
        assert_eq!(
            "Website".parse::<ExtractionMode>().unwrap(),
            ExtractionMode::Website
        );
        assert_eq!(
            "semantic".parse::<ExtractionMode>().unwrap(),
            ExtractionMode::Semantic
        );
        assert!("ocr".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn test_list_block_text_joins_items() {
        let block = PageBlock::list(vec!["one".into(), "two".into()]);
        assert_eq!(block.text, "one two");
        assert_eq!(block.kind, BlockType::List);
    }

    #[test]
    fn test_block_serialization_skips_empty_items() {
        let json = serde_json::to_string(&PageBlock::paragraph("Hi")).unwrap();
        assert_eq!(json, r#"{"kind":"paragraph","text":"Hi"}"#);
    }

    #[test]
    fn test_document_blocks_iterates_in_order() {
        let doc = ExtractedDocument {
            mode: ExtractionMode::Website,
            dominant_font_size: 11.0,
            pages: vec![
                Page {
                    number: 1,
                    blocks: vec![PageBlock::heading("A")],
                },
                Page {
                    number: 3,
                    blocks: vec![PageBlock::paragraph("B"), PageBlock::paragraph("C")],
                },
            ],
        };
        let order: Vec<(usize, &str)> = doc.blocks().map(|(p, b)| (p, b.text.as_str())).collect();
        assert_eq!(order, vec![(1, "A"), (3, "B"), (3, "C")]);
        assert_eq!(doc.block_count(), 3);
    }
}
