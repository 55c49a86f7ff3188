//! Where reading goes after the word stream runs out.
//!
//! A [`ContinuationProvider`] answers one question: given the last block
//! that was read, what comes next in document order? The answer is either a
//! block to read or a block to pause before.

use crate::block::{BlockKind, BlockRef};
use crate::tree::DocBlock;

#[derive(Debug, Clone, PartialEq)]
pub enum Continuation<B> {
    /// Append this block to the stream.
    Readable(B),
    /// Pause at a checkpoint anchored on this block.
    Stop(B),
}

impl<B> Continuation<B> {
    pub fn block(&self) -> &B {
        match self {
            Continuation::Readable(b) | Continuation::Stop(b) => b,
        }
    }
}

pub trait ContinuationProvider<B> {
    /// The first block after `after` worth reading or stopping at.
    fn next_block(&self, after: &B) -> Option<Continuation<B>>;
}

// ---------------------------------------------------------------------------
// SequenceProvider
// ---------------------------------------------------------------------------

/// Continues through a pre-extracted, ordered block list.
///
/// Relies on ids increasing in document order, so `after` does not have to
/// be part of the list itself.
#[derive(Debug, Clone)]
pub struct SequenceProvider<B> {
    blocks: Vec<B>,
}

impl<B: BlockRef> SequenceProvider<B> {
    pub fn new(blocks: Vec<B>) -> Self {
        SequenceProvider { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<B: BlockRef> ContinuationProvider<B> for SequenceProvider<B> {
    fn next_block(&self, after: &B) -> Option<Continuation<B>> {
        let after = after.id();
        self.blocks
            .iter()
            .find(|b| b.id() > after)
            .cloned()
            .map(Continuation::Readable)
    }
}

// ---------------------------------------------------------------------------
// SiblingWalker
// ---------------------------------------------------------------------------

/// Walks following siblings, then the following siblings of each ancestor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingWalker;

impl SiblingWalker {
    fn start_point(after: &DocBlock) -> DocBlock {
        if after.kind() == BlockKind::ListItem {
            if let Some(parent) = after.parent() {
                if matches!(parent.kind(), BlockKind::List { .. }) {
                    return parent;
                }
            }
        }
        after.clone()
    }

    fn is_stop_anchor(block: &DocBlock) -> bool {
        matches!(
            block.kind(),
            BlockKind::Media | BlockKind::Table | BlockKind::Code | BlockKind::List { .. }
        )
    }

    /// `block` itself or its first descendant that playback pauses before.
    fn stop_candidate(block: &DocBlock) -> Option<DocBlock> {
        if Self::is_stop_anchor(block) {
            return Some(block.clone());
        }
        block.descendants().into_iter().find(Self::is_stop_anchor)
    }

    fn is_readable_candidate(block: &DocBlock) -> bool {
        matches!(
            block.kind(),
            BlockKind::Heading { .. } | BlockKind::Paragraph | BlockKind::Quote
        ) && !block.is_inside_list()
    }

    /// `block` itself or its first readable descendant outside any list.
    fn readable_candidate(block: &DocBlock) -> Option<DocBlock> {
        if Self::is_readable_candidate(block) {
            return Some(block.clone());
        }
        block
            .descendants()
            .into_iter()
            .find(Self::is_readable_candidate)
    }
}

impl ContinuationProvider<DocBlock> for SiblingWalker {
    fn next_block(&self, after: &DocBlock) -> Option<Continuation<DocBlock>> {
        let mut cursor = Some(Self::start_point(after));

        while let Some(current) = cursor {
            let mut sibling = current.next_sibling();
            while let Some(candidate) = sibling {
                let readable = Self::readable_candidate(&candidate);

                if let Some(stop) = Self::stop_candidate(&candidate) {
                    let precedes = readable.as_ref().is_none_or(|r| stop.id() <= r.id());
                    if precedes {
                        return Some(Continuation::Stop(stop));
                    }
                }
                if let Some(readable) = readable {
                    return Some(Continuation::Readable(readable));
                }
                sibling = candidate.next_sibling();
            }
            cursor = current.parent();
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::block::BlockId;
    use crate::tree::{DocumentTree, TreeBuilder};

    /// ```text
    /// 0 P "intro"
    /// 1 UL
    ///   2 LI "a"
    ///   3 LI "b"
    /// 4 DIV
    ///   5 P "inside div"
    ///   6 IMG "diagram"
    /// 7 DIV
    ///   8 IMG ""
    ///   9 P "caption"
    /// 10 H2 "End"
    /// ```
    fn tree_with() -> Rc<DocumentTree> {
        let mut b = TreeBuilder::new();
        b.leaf(BlockKind::Paragraph, "intro");
        b.open(BlockKind::List { ordered: false }, "");
        b.leaf(BlockKind::ListItem, "a");
        b.leaf(BlockKind::ListItem, "b");
        b.close();
        b.open(BlockKind::Container, "");
        b.leaf(BlockKind::Paragraph, "inside div");
        b.leaf(BlockKind::Media, "diagram");
        b.close();
        b.open(BlockKind::Container, "");
        b.leaf(BlockKind::Media, "");
        b.leaf(BlockKind::Paragraph, "caption");
        b.close();
        b.leaf(BlockKind::heading(2), "End");
        b.build()
    }

    fn next_id(tree: &Rc<DocumentTree>, after: u64) -> Option<(bool, BlockId)> {
        let block = tree.block(BlockId(after)).unwrap();
        SiblingWalker.next_block(&block).map(|c| match c {
            Continuation::Readable(b) => (true, b.id()),
            Continuation::Stop(b) => (false, b.id()),
        })
    }

    // ====================================================================
    // SiblingWalker
    // ====================================================================

    #[test]
    fn test_list_sibling_is_a_stop() {
        let tree = tree_with();
        assert_eq!(next_id(&tree, 0), Some((false, BlockId(1))));
    }

    #[test]
    fn test_list_item_starts_after_its_list() {
        let tree = tree_with();
        assert_eq!(next_id(&tree, 2), Some((true, BlockId(5))));
    }

    #[test]
    fn test_readable_before_stop_in_same_container() {
        let tree = tree_with();
        assert_eq!(next_id(&tree, 1), Some((true, BlockId(5))));
    }

    #[test]
    fn test_stop_inside_container_then_walk_up() {
        let tree = tree_with();
        // Inside DIV 4: P 5 is followed by IMG 6.
        assert_eq!(next_id(&tree, 5), Some((false, BlockId(6))));
        // After the image, the walk climbs to DIV 4 and enters DIV 7, whose
        // image precedes its caption.
        assert_eq!(next_id(&tree, 6), Some((false, BlockId(8))));
        assert_eq!(next_id(&tree, 8), Some((true, BlockId(9))));
    }

    #[test]
    fn test_walk_ends_at_document_end() {
        let tree = tree_with();
        assert_eq!(next_id(&tree, 9), Some((true, BlockId(10))));
        assert_eq!(next_id(&tree, 10), None);
    }

    // ====================================================================
    // SequenceProvider
    // ====================================================================

    #[test]
    fn test_sequence_continues_by_document_order() {
        let tree = tree_with();
        let provider = SequenceProvider::new(vec![
            tree.block(BlockId(4)).unwrap(),
            tree.block(BlockId(10)).unwrap(),
        ]);
        let from_intro = provider.next_block(&tree.block(BlockId(0)).unwrap());
        assert_eq!(from_intro.map(|c| c.block().id()), Some(BlockId(4)));

        let from_div = provider.next_block(&tree.block(BlockId(4)).unwrap());
        assert!(matches!(from_div, Some(Continuation::Readable(ref b)) if b.id() == BlockId(10)));

        assert!(provider.next_block(&tree.block(BlockId(10)).unwrap()).is_none());
    }
}
