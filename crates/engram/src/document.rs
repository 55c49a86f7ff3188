//! Extracted PDF blocks as a block tree the reader can select and stream.

use std::rc::Rc;

use engram_core::block::BlockKind;
use engram_core::tree::{DocBlock, DocumentTree, TreeBuilder};
use pdf::{BlockType, PageBlock};

/// Heading level used for every extracted heading.
const PDF_HEADING_LEVEL: u8 = 2;

/// A tree over the reading range followed by the pages after it.
pub struct ReadingDocument {
    pub tree: Rc<DocumentTree>,
    /// Top-level blocks of the reading range.
    pub selected: Vec<DocBlock>,
    /// Top-level blocks after the reading range, in order.
    pub rest: Vec<DocBlock>,
}

impl ReadingDocument {
    pub fn new(selected: &[PageBlock], rest: &[PageBlock]) -> Self {
        let tree = build_tree(selected.iter().chain(rest));
        let mut roots = tree.roots();
        let rest_roots = roots.split_off(selected.len().min(roots.len()));
        ReadingDocument {
            tree,
            selected: roots,
            rest: rest_roots,
        }
    }
}

/// One top-level tree block per extracted block.
///
/// Lists get one `ListItem` child per item. Tables get one `Row` per line
/// with a `Cell` per whitespace-separated token.
pub fn build_tree<'a>(blocks: impl IntoIterator<Item = &'a PageBlock>) -> Rc<DocumentTree> {
    let mut builder = TreeBuilder::new();
    for block in blocks {
        match block.kind {
            BlockType::Heading => {
                builder.leaf(BlockKind::heading(PDF_HEADING_LEVEL), block.text.as_str());
            }
            BlockType::Paragraph => {
                builder.leaf(BlockKind::Paragraph, block.text.as_str());
            }
            BlockType::List => {
                builder.open(BlockKind::List { ordered: false }, "");
                for item in &block.items {
                    builder.leaf(BlockKind::ListItem, item.as_str());
                }
                builder.close();
            }
            BlockType::Table => {
                builder.open(BlockKind::Table, "");
                for line in block.text.lines().filter(|l| !l.trim().is_empty()) {
                    builder.open(BlockKind::Row, "");
                    for cell in line.split_whitespace() {
                        builder.leaf(BlockKind::Cell, cell);
                    }
                    builder.close();
                }
                builder.close();
            }
        }
    }
    builder.build()
}
