//! Word-stream building.
//!
//! Flattens an ordered sequence of blocks into one word array and records,
//! for every block, the inclusive range of word indices it covers.
//!
//! ```text
//! [H2 "Intro"] [P "Some body text"]   ->   words: Intro Some body text
//!                                          blocks: [0..=0] [1..=3]
//! ```
//!
//! Blocks that tokenize to zero words are dropped, so every stored range is
//! non-empty and ranges are contiguous.

use crate::block::{BlockKind, BlockRef, SemanticType};

/// Collapse whitespace runs and trim.
pub fn sanitize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A block placed in a word stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticBlock<B> {
    pub kind: BlockKind,
    pub text: String,
    /// Item texts of a list block. Empty for other kinds.
    pub items: Vec<String>,
    /// First word index (inclusive).
    pub start: usize,
    /// Last word index (inclusive).
    pub end: usize,
    pub source: Option<B>,
}

impl<B> SemanticBlock<B> {
    pub fn semantic_type(&self) -> SemanticType {
        self.kind.semantic_type()
    }

    pub fn word_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_list(&self) -> bool {
        self.kind.is_list()
    }

    pub fn contains_word(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Words plus the blocks they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct WordStream<B> {
    pub words: Vec<String>,
    pub blocks: Vec<SemanticBlock<B>>,
}

impl<B> Default for WordStream<B> {
    fn default() -> Self {
        WordStream {
            words: Vec::new(),
            blocks: Vec::new(),
        }
    }
}

impl<B> WordStream<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append a block from its text. List blocks pass their items and get the
    /// space-joined items as text. Returns `false` when nothing was appended.
    pub fn push_text(
        &mut self,
        kind: BlockKind,
        text: &str,
        items: Vec<String>,
        source: Option<B>,
    ) -> bool {
        let items: Vec<String> = items
            .iter()
            .map(|item| sanitize_text(item))
            .filter(|item| !item.is_empty())
            .collect();
        let text = if kind.is_list() && !items.is_empty() {
            items.join(" ")
        } else {
            sanitize_text(text)
        };

        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return false;
        }

        let start = self.words.len();
        self.words.extend(words);
        self.blocks.push(SemanticBlock {
            kind,
            text,
            items,
            start,
            end: self.words.len() - 1,
            source,
        });
        true
    }

    /// Index of the block covering word `index`.
    pub fn block_at(&self, index: usize) -> Option<usize> {
        self.blocks.iter().position(|b| b.contains_word(index))
    }

    /// The block pair `(i, i + 1)` whose boundary sits on word `index`.
    pub fn boundary_at(&self, index: usize) -> Option<(usize, usize)> {
        self.blocks
            .windows(2)
            .position(|pair| pair[0].end == index)
            .map(|i| (i, i + 1))
    }
}

impl<B: BlockRef> WordStream<B> {
    /// Build a stream from blocks in the given order.
    pub fn from_blocks<I: IntoIterator<Item = B>>(blocks: I) -> Self {
        let mut stream = Self::new();
        for block in blocks {
            stream.push_block(block);
        }
        stream
    }

    /// Append one block. Lists contribute their item children.
    pub fn push_block(&mut self, block: B) -> bool {
        let kind = block.kind();
        let items = match kind {
            BlockKind::List { .. } => block
                .children()
                .iter()
                .filter(|child| child.kind() == BlockKind::ListItem)
                .map(|child| child.text())
                .collect(),
            BlockKind::ListItem => vec![block.text()],
            _ => Vec::new(),
        };
        let text = block.text();
        self.push_text(kind, &text, items, Some(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{DocBlock, TreeBuilder};

    fn paragraph(stream: &mut WordStream<DocBlock>, text: &str) -> bool {
        stream.push_text(BlockKind::Paragraph, text, Vec::new(), None)
    }

    // ====================================================================
    // Ranges
    // ====================================================================

    #[test]
    fn test_ranges_are_contiguous() {
        let mut stream = WordStream::new();
        paragraph(&mut stream, "one two");
        stream.push_text(BlockKind::heading(2), "Three", Vec::new(), None);
        paragraph(&mut stream, "four five six");

        let ranges: Vec<(usize, usize)> = stream.blocks.iter().map(|b| (b.start, b.end)).collect();
        assert_eq!(ranges, vec![(0, 1), (2, 2), (3, 5)]);

        let total: usize = stream.blocks.iter().map(|b| b.word_count()).sum();
        assert_eq!(total, stream.len(), "block word counts cover the stream");
    }

    #[test]
    fn test_empty_blocks_are_dropped() {
        let mut stream = WordStream::new();
        assert!(paragraph(&mut stream, "first"));
        assert!(!paragraph(&mut stream, "   \n\t "));
        assert!(paragraph(&mut stream, "second"));
        assert_eq!(stream.blocks.len(), 2);
        assert_eq!(stream.blocks[1].start, 1);
    }

    #[test]
    fn test_list_text_is_joined_items() {
        let mut stream: WordStream<DocBlock> = WordStream::new();
        stream.push_text(
            BlockKind::List { ordered: false },
            "ignored",
            vec!["alpha  beta".into(), "".into(), "gamma".into()],
            None,
        );
        let block = &stream.blocks[0];
        assert_eq!(block.items, vec!["alpha beta", "gamma"]);
        assert_eq!(block.text, "alpha beta gamma");
        assert_eq!(stream.words, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_boundary_lookup() {
        let mut stream = WordStream::new();
        paragraph(&mut stream, "a b c d e");
        stream.push_text(BlockKind::heading(2), "Next", Vec::new(), None);
        assert_eq!(stream.boundary_at(4), Some((0, 1)));
        assert_eq!(stream.boundary_at(3), None);
        assert_eq!(stream.boundary_at(5), None, "last block has no successor");
        assert_eq!(stream.block_at(5), Some(1));
    }

    // ====================================================================
    // From blocks
    // ====================================================================

    #[test]
    fn test_from_tree_blocks() {
        let mut b = TreeBuilder::new();
        let h = b.leaf(BlockKind::heading(2), "Intro");
        let p = b.leaf(BlockKind::Paragraph, "Some body text");
        let list = b.open(BlockKind::List { ordered: true }, "");
        b.leaf(BlockKind::ListItem, "first");
        b.leaf(BlockKind::ListItem, "second");
        b.close();
        let tree = b.build();

        let blocks = [h, p, list].map(|id| tree.block(id).unwrap());
        let stream = WordStream::from_blocks(blocks);

        assert_eq!(stream.words.len(), 6);
        assert_eq!(stream.blocks[0].semantic_type(), SemanticType::Header);
        assert_eq!(stream.blocks[2].items, vec!["first", "second"]);
        assert_eq!(
            stream.blocks[2].source.as_ref().map(|s| s.id()),
            Some(list)
        );
    }
}
