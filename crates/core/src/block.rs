//! Block handles.
//!
//! The reader never depends on a concrete document tree. Anything that can
//! answer [`BlockRef`] (its id, kind, text and tree neighbours) can be
//! selected, streamed, stopped at and continued from.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable block identity. Ids are unique within a document and increase in
/// document order, so sorting by id sorts by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Structural kind of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BlockKind {
    /// Heading with level 1..=6.
    Heading { level: u8 },
    Paragraph,
    Quote,
    List { ordered: bool },
    ListItem,
    Table,
    Row,
    Cell,
    Code,
    /// Image or other embedded media. The block text is its alt text.
    Media,
    Container,
}

impl BlockKind {
    pub fn heading(level: u8) -> Self {
        BlockKind::Heading {
            level: level.clamp(1, 6),
        }
    }

    /// Upper-case display tag.
    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::Heading { level } => match level {
                0 | 1 => "H1",
                2 => "H2",
                3 => "H3",
                4 => "H4",
                5 => "H5",
                _ => "H6",
            },
            BlockKind::Paragraph => "P",
            BlockKind::Quote => "BLOCKQUOTE",
            BlockKind::List { ordered: false } => "UL",
            BlockKind::List { ordered: true } => "OL",
            BlockKind::ListItem => "LI",
            BlockKind::Table => "TABLE",
            BlockKind::Row => "TR",
            BlockKind::Cell => "TD",
            BlockKind::Code => "PRE",
            BlockKind::Media => "IMG",
            BlockKind::Container => "DIV",
        }
    }

    /// Blocks a user can select and that auto-continue may read.
    pub fn is_readable(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading { .. }
                | BlockKind::Paragraph
                | BlockKind::Quote
                | BlockKind::List { .. }
                | BlockKind::ListItem
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, BlockKind::List { .. } | BlockKind::ListItem)
    }

    pub fn semantic_type(&self) -> SemanticType {
        match self {
            BlockKind::Heading { .. } => SemanticType::Header,
            _ => SemanticType::Paragraph,
        }
    }

    /// The checkpoint kind playback pauses before, if any.
    pub fn stop_kind(&self) -> Option<StopKind> {
        match self {
            BlockKind::Media => Some(StopKind::Media),
            BlockKind::Table => Some(StopKind::Table),
            BlockKind::Code => Some(StopKind::Code),
            BlockKind::List { .. } | BlockKind::ListItem => Some(StopKind::List),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Header boundaries pause on `Header`; everything else reads as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Header,
    Paragraph,
}

/// Kinds of non-text checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Media,
    List,
    Table,
    Code,
}

impl StopKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopKind::Media => "media",
            StopKind::List => "list",
            StopKind::Table => "table",
            StopKind::Code => "code",
        }
    }
}

// ---------------------------------------------------------------------------
// BlockRef
// ---------------------------------------------------------------------------

/// An opaque handle to a block of some document.
pub trait BlockRef: Clone + fmt::Debug {
    fn id(&self) -> BlockId;
    fn kind(&self) -> BlockKind;
    /// Visible text of the block, including its descendants.
    fn text(&self) -> String;
    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Vec<Self>;

    /// `true` when `other` is a strict ancestor of `self`.
    fn has_ancestor(&self, other: &Self) -> bool {
        let target = other.id();
        let mut cursor = self.parent();
        while let Some(block) = cursor {
            if block.id() == target {
                return true;
            }
            cursor = block.parent();
        }
        false
    }

    /// `true` when the block is a list, a list item, or sits inside one.
    fn is_inside_list(&self) -> bool {
        if self.kind().is_list() {
            return true;
        }
        let mut cursor = self.parent();
        while let Some(block) = cursor {
            if block.kind().is_list() {
                return true;
            }
            cursor = block.parent();
        }
        false
    }
}
