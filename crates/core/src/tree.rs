//! Arena document tree.
//!
//! Nodes are stored in pre-order, so a node's index is its [`BlockId`] and
//! ids increase in document order.
//!
//! ```text
//! TreeBuilder::open(List) ─┬─ leaf(ListItem, "one")
//!                          └─ leaf(ListItem, "two")
//! TreeBuilder::close()
//! ```

use std::fmt;
use std::rc::Rc;

use crate::block::{BlockId, BlockKind, BlockRef};

#[derive(Debug, Clone)]
struct Node {
    kind: BlockKind,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// An immutable tree of blocks.
#[derive(Debug, Default)]
pub struct DocumentTree {
    nodes: Vec<Node>,
}

impl DocumentTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level blocks in document order.
    pub fn roots(self: &Rc<Self>) -> Vec<DocBlock> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| self.handle(index))
            .collect()
    }

    pub fn block(self: &Rc<Self>, id: BlockId) -> Option<DocBlock> {
        let index = usize::try_from(id.0).ok()?;
        (index < self.nodes.len()).then(|| self.handle(index))
    }

    /// Every block in document order.
    pub fn blocks(self: &Rc<Self>) -> Vec<DocBlock> {
        (0..self.nodes.len()).map(|i| self.handle(i)).collect()
    }

    fn handle(self: &Rc<Self>, index: usize) -> DocBlock {
        DocBlock {
            tree: Rc::clone(self),
            index,
        }
    }

    fn collect_text(&self, index: usize) -> String {
        let node = &self.nodes[index];
        if !node.text.trim().is_empty() {
            return node.text.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        node.children
            .iter()
            .map(|&child| self.collect_text(child))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds a [`DocumentTree`] in document order.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    open: Vec<usize>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a block that will receive children until [`TreeBuilder::close`].
    pub fn open(&mut self, kind: BlockKind, text: impl Into<String>) -> BlockId {
        let index = self.push(kind, text.into());
        self.open.push(index);
        BlockId(index as u64)
    }

    /// Add a block without children.
    pub fn leaf(&mut self, kind: BlockKind, text: impl Into<String>) -> BlockId {
        BlockId(self.push(kind, text.into()) as u64)
    }

    /// Close the innermost open block. Closing with nothing open is a no-op.
    pub fn close(&mut self) -> &mut Self {
        self.open.pop();
        self
    }

    /// Finish the tree. Blocks still open are closed.
    pub fn build(self) -> Rc<DocumentTree> {
        Rc::new(DocumentTree { nodes: self.nodes })
    }

    fn push(&mut self, kind: BlockKind, text: String) -> usize {
        let index = self.nodes.len();
        let parent = self.open.last().copied();
        self.nodes.push(Node {
            kind,
            text,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        index
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A block of a shared [`DocumentTree`].
#[derive(Clone)]
pub struct DocBlock {
    tree: Rc<DocumentTree>,
    index: usize,
}

impl DocBlock {
    fn node(&self) -> &Node {
        &self.tree.nodes[self.index]
    }

    pub fn next_sibling(&self) -> Option<DocBlock> {
        let siblings = match self.node().parent {
            Some(parent) => &self.tree.nodes[parent].children,
            None => {
                return self.tree.nodes[self.index + 1..]
                    .iter()
                    .position(|node| node.parent.is_none())
                    .map(|offset| self.tree.handle(self.index + 1 + offset));
            }
        };
        let position = siblings.iter().position(|&i| i == self.index)?;
        siblings
            .get(position + 1)
            .map(|&i| self.tree.handle(i))
    }

    /// Descendants in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<DocBlock> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.node().children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            out.push(self.tree.handle(index));
            stack.extend(self.tree.nodes[index].children.iter().rev().copied());
        }
        out
    }
}

impl BlockRef for DocBlock {
    fn id(&self) -> BlockId {
        BlockId(self.index as u64)
    }

    fn kind(&self) -> BlockKind {
        self.node().kind
    }

    fn text(&self) -> String {
        self.tree.collect_text(self.index)
    }

    fn parent(&self) -> Option<Self> {
        self.node().parent.map(|p| self.tree.handle(p))
    }

    fn children(&self) -> Vec<Self> {
        self.node()
            .children
            .iter()
            .map(|&c| self.tree.handle(c))
            .collect()
    }
}

impl PartialEq for DocBlock {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.index == other.index
    }
}

impl Eq for DocBlock {}

impl fmt::Debug for DocBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocBlock({} {})", self.index, self.node().kind.tag())
    }
}
