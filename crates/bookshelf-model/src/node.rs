//! Nodes of the materialized hierarchy and their stable identities.
//!
//! Row ids are content hashes, not allocation counters: a header's id is a
//! function of its level and key path, a leaf's id a function of its parent
//! key path and book id. Rebuilding with the same grouping therefore
//! reproduces the same ids regardless of expand state, which is what lets a
//! caller restore its scroll anchor across rebuilds.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::record::BookId;

// Distinct seeds keep header and leaf id spaces apart even for equal input
// bytes.
const HEADER_SEED: u64 = 0x426f_6f6b_4864_7221;
const LEAF_SEED: u64 = 0x426f_6f6b_4c66_7221;

/// Separator between key-path segments in the hashed byte form. Group keys
/// are display-ish strings and never contain control characters.
const SEGMENT_SEP: u8 = 0x1f;

/// Stable synthetic identifier of one row (header or leaf) in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The chain of case-folded group keys from the outermost level down to a
/// node. Identifies a group header independently of row positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The empty path (parent of all root-level nodes).
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns this path extended by one folded key.
    pub fn child(&self, folded_key: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(folded_key.to_owned());
        Self { segments }
    }

    /// Number of segments; equals the owning header's level + 1.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The folded key segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for segment in &self.segments {
            bytes.extend_from_slice(segment.as_bytes());
            bytes.push(SEGMENT_SEP);
        }
        bytes
    }

    /// Stable row id of the header at this path.
    pub fn header_row_id(&self) -> RowId {
        RowId(xxh3_64_with_seed(&self.hash_bytes(), HEADER_SEED))
    }

    /// Stable row id of a leaf under this path.
    ///
    /// The path is part of the identity: a two-author book grouped by author
    /// yields two distinct leaf rows, one per parent.
    pub fn leaf_row_id(&self, book: BookId) -> RowId {
        let mut bytes = self.hash_bytes();
        bytes.extend_from_slice(&book.0.to_le_bytes());
        RowId(xxh3_64_with_seed(&bytes, LEAF_SEED))
    }
}

/// Index of a node in the arena. Internal; positions and row ids are the
/// public addressing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIndex(pub(crate) usize);

/// A synthetic group header node.
#[derive(Debug, Clone)]
pub(crate) struct HeaderNode {
    pub row_id: RowId,
    /// Level index within the grouping specification, 0 = outermost.
    pub level: usize,
    pub key_path: KeyPath,
    pub label: String,
    /// Number of leaf rows anywhere in this subtree.
    pub book_count: usize,
    pub expanded: bool,
    pub children: Vec<NodeIndex>,
}

/// A leaf node wrapping one book occurrence.
#[derive(Debug, Clone)]
pub(crate) struct LeafNode {
    pub row_id: RowId,
    pub book_id: BookId,
    pub title: String,
}

/// Arena storage for a node.
#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Header(HeaderNode),
    Leaf(LeafNode),
}

impl NodeData {
    pub fn row_id(&self) -> RowId {
        match self {
            Self::Header(h) => h.row_id,
            Self::Leaf(l) => l.row_id,
        }
    }
}

/// One visible row as handed to a list adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// A group header.
    Header {
        /// Stable row id; pass to `toggle` / `position_of`.
        row_id: RowId,
        /// Level index, 0 = outermost.
        level: usize,
        /// Display label for the group value.
        label: String,
        /// Number of books in the subtree.
        book_count: usize,
        /// Current expand state.
        expanded: bool,
    },
    /// A book occurrence.
    Book {
        /// Stable row id (distinct per parent group).
        row_id: RowId,
        /// The underlying record id.
        book_id: BookId,
        /// Display title.
        title: String,
    },
}

impl Row {
    /// The stable row id of this row.
    pub fn row_id(&self) -> RowId {
        match self {
            Self::Header { row_id, .. } | Self::Book { row_id, .. } => *row_id,
        }
    }

    /// `true` for group headers.
    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header { .. })
    }
}
