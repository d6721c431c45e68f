//! The materialized booklist: retained node graph plus the currently
//! visible, flattened row sequence.
//!
//! The node graph survives collapses; collapsing a header only removes the
//! contiguous run of its visible descendants from the flattened sequence,
//! and expanding splices them back from the retained graph. Nothing here
//! ever touches the record source again.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::node::{NodeData, NodeIndex, Row, RowId};

/// A built list: node arena, visible sequence and position index.
///
/// Produced by [`build`](crate::build); read through positions or row ids,
/// mutated only by the expand/collapse operations.
#[derive(Debug, Clone)]
pub struct Booklist {
    nodes: Vec<NodeData>,
    roots: Vec<NodeIndex>,
    /// The flattened list: arena indices of currently visible nodes.
    visible: Vec<NodeIndex>,
    /// Visible position per row id; rebuilt whenever `visible` changes.
    positions: HashMap<RowId, usize>,
    /// Arena index per row id; covers hidden nodes too.
    by_row_id: HashMap<RowId, NodeIndex>,
}

impl Booklist {
    pub(crate) fn from_arena(nodes: Vec<NodeData>, roots: Vec<NodeIndex>) -> Self {
        let by_row_id = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.row_id(), NodeIndex(i)))
            .collect();
        let mut list = Self {
            nodes,
            roots,
            visible: Vec::new(),
            positions: HashMap::new(),
            by_row_id,
        };
        list.recompute_visible();
        list
    }

    /// Number of currently visible rows (headers plus leaves).
    pub fn count(&self) -> usize {
        self.visible.len()
    }

    /// `true` when nothing is visible (an empty record set).
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// The visible row at `position`.
    pub fn row(&self, position: usize) -> Result<Row> {
        let idx = self
            .visible
            .get(position)
            .copied()
            .ok_or(Error::PositionOutOfRange {
                position,
                count: self.visible.len(),
            })?;
        Ok(self.make_row(idx))
    }

    /// Iterates over all visible rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.visible.iter().map(|&idx| self.make_row(idx))
    }

    /// The current visible position of a row, or `None` when the row is
    /// hidden under a collapsed ancestor or no longer exists.
    pub fn position_of(&self, row_id: RowId) -> Option<usize> {
        self.positions.get(&row_id).copied()
    }

    /// Flips the expand state of a header.
    ///
    /// For a visible header, splices only its descendant run in or out of
    /// the flattened sequence; the node graph is untouched. A header hidden
    /// under a collapsed ancestor still flips its flag, with no splice; the
    /// new state takes effect when the ancestor expands. Returns the new
    /// state, or `None` when the row id is stale or names a leaf.
    pub fn toggle(&mut self, row_id: RowId) -> Option<bool> {
        let idx = *self.by_row_id.get(&row_id)?;
        let was_expanded = match &self.nodes[idx.0] {
            NodeData::Header(h) => h.expanded,
            NodeData::Leaf(_) => return None,
        };
        if let NodeData::Header(h) = &mut self.nodes[idx.0] {
            h.expanded = !was_expanded;
        }

        let Some(position) = self.positions.get(&row_id).copied() else {
            trace!(%row_id, expanded = !was_expanded, "hidden header toggled");
            return Some(!was_expanded);
        };

        if was_expanded {
            let run = self.visible_descendant_count(idx);
            self.visible.drain(position + 1..position + 1 + run);
            trace!(%row_id, position, removed = run, "header collapsed");
        } else {
            let mut run = Vec::new();
            self.collect_visible_descendants(idx, &mut run);
            let inserted = run.len();
            self.visible.splice(position + 1..position + 1, run);
            trace!(%row_id, position, inserted, "header expanded");
        }

        self.rebuild_positions();
        Some(!was_expanded)
    }

    /// Sets every header to the same state and recomputes the visible
    /// sequence once.
    pub fn set_all_expanded(&mut self, expanded: bool) {
        for node in &mut self.nodes {
            if let NodeData::Header(h) = node {
                h.expanded = expanded;
            }
        }
        self.recompute_visible();
        trace!(expanded, count = self.visible.len(), "expand state reset");
    }

    /// Total number of leaf rows in the graph, visible or not.
    pub fn book_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, NodeData::Leaf(_)))
            .count()
    }

    fn make_row(&self, idx: NodeIndex) -> Row {
        match &self.nodes[idx.0] {
            NodeData::Header(h) => Row::Header {
                row_id: h.row_id,
                level: h.level,
                label: h.label.clone(),
                book_count: h.book_count,
                expanded: h.expanded,
            },
            NodeData::Leaf(l) => Row::Book {
                row_id: l.row_id,
                book_id: l.book_id,
                title: l.title.clone(),
            },
        }
    }

    /// Number of descendants of `idx` that are visible given the current
    /// per-header flags, assuming `idx` itself is expanded.
    fn visible_descendant_count(&self, idx: NodeIndex) -> usize {
        let NodeData::Header(h) = &self.nodes[idx.0] else {
            return 0;
        };
        let mut count = 0;
        for &child in &h.children {
            count += 1;
            if let NodeData::Header(ch) = &self.nodes[child.0] {
                if ch.expanded {
                    count += self.visible_descendant_count(child);
                }
            }
        }
        count
    }

    /// Collects the visible descendants of `idx` in flattened order,
    /// assuming `idx` itself is expanded.
    fn collect_visible_descendants(&self, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
        let NodeData::Header(h) = &self.nodes[idx.0] else {
            return;
        };
        for &child in &h.children {
            out.push(child);
            if let NodeData::Header(ch) = &self.nodes[child.0] {
                if ch.expanded {
                    self.collect_visible_descendants(child, out);
                }
            }
        }
    }

    fn recompute_visible(&mut self) {
        let mut visible = Vec::new();
        for &root in &self.roots {
            visible.push(root);
            if let NodeData::Header(h) = &self.nodes[root.0] {
                if h.expanded {
                    self.collect_visible_descendants(root, &mut visible);
                }
            }
        }
        self.visible = visible;
        self.rebuild_positions();
    }

    fn rebuild_positions(&mut self) {
        self.positions = self
            .visible
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (self.nodes[idx.0].row_id(), pos))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::collate::Collation;
    use crate::expand::ExpandState;
    use crate::group::{GroupKind, GroupingSpec};
    use crate::record::{Author, Book};

    fn author_list() -> Booklist {
        let books = vec![
            Book::new(1, "Watership Down").with_author(Author::new("Richard Adams")),
            Book::new(2, "The Plague Dogs").with_author(Author::new("Richard Adams")),
            Book::new(3, "Sundiver").with_author(Author::new("David Brin")),
        ];
        build(
            &books,
            &GroupingSpec::new([GroupKind::Author]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap()
    }

    fn header_id(list: &Booklist, label_prefix: &str) -> RowId {
        list.rows()
            .find_map(|row| match row {
                Row::Header { row_id, ref label, .. } if label.starts_with(label_prefix) => {
                    Some(row_id)
                }
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_count_and_get() {
        let list = author_list();
        assert_eq!(list.count(), 5);
        assert!(list.row(0).unwrap().is_header());
        assert!(!list.row(1).unwrap().is_header());

        let err = list.row(5).unwrap_err();
        assert_eq!(
            err,
            Error::PositionOutOfRange {
                position: 5,
                count: 5
            }
        );
    }

    #[test]
    fn test_collapse_hides_run_only() {
        let mut list = author_list();
        let adams = header_id(&list, "Adams");

        assert_eq!(list.toggle(adams), Some(false));
        // Header(Adams, collapsed), Header(Brin), Leaf(Sundiver).
        assert_eq!(list.count(), 3);
        let rows: Vec<Row> = list.rows().collect();
        assert!(matches!(&rows[0], Row::Header { expanded: false, .. }));
        assert!(matches!(&rows[1], Row::Header { expanded: true, .. }));
        assert!(matches!(&rows[2], Row::Book { .. }));
    }

    #[test]
    fn test_toggle_round_trip_restores_identities() {
        let mut list = author_list();
        let before: Vec<RowId> = list.rows().map(|r| r.row_id()).collect();
        let adams = header_id(&list, "Adams");

        assert_eq!(list.toggle(adams), Some(false));
        assert_eq!(list.toggle(adams), Some(true));

        let after: Vec<RowId> = list.rows().map(|r| r.row_id()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_toggle_leaf_or_stale_is_none() {
        let mut list = author_list();
        let leaf = list
            .rows()
            .find(|r| !r.is_header())
            .map(|r| r.row_id())
            .unwrap();
        assert_eq!(list.toggle(leaf), None);
        assert_eq!(list.toggle(RowId(0xdead_beef)), None);
    }

    #[test]
    fn test_position_of_after_collapse() {
        let mut list = author_list();
        let adams = header_id(&list, "Adams");
        let hidden_leaf = list.row(1).unwrap().row_id();
        let sundiver = list.row(4).unwrap().row_id();

        assert_eq!(list.toggle(adams), Some(false));

        assert_eq!(list.position_of(hidden_leaf), None);
        assert_eq!(list.position_of(sundiver), Some(2));
    }

    #[test]
    fn test_collapse_all_expand_all() {
        let mut list = author_list();
        list.set_all_expanded(false);
        assert_eq!(list.count(), 2); // two collapsed headers

        list.set_all_expanded(true);
        assert_eq!(list.count(), 5);

        // Idempotent: repeating changes nothing.
        let ids: Vec<RowId> = list.rows().map(|r| r.row_id()).collect();
        list.set_all_expanded(true);
        let again: Vec<RowId> = list.rows().map(|r| r.row_id()).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_toggle_hidden_header_flips_without_splicing() {
        let books = vec![
            Book::new(1, "Foundation")
                .with_author(Author::new("Isaac Asimov"))
                .with_series(crate::record::Series::new("Foundation")),
            Book::new(2, "Nightfall").with_author(Author::new("Isaac Asimov")),
        ];
        let mut list = build(
            &books,
            &GroupingSpec::new([GroupKind::Author, GroupKind::Series]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();
        let series = header_id(&list, "Foundation");
        let author = header_id(&list, "Asimov");

        // Hide the series header, then toggle it while hidden.
        assert_eq!(list.toggle(author), Some(false));
        assert_eq!(list.position_of(series), None);
        let before: Vec<RowId> = list.rows().map(|r| r.row_id()).collect();

        assert_eq!(list.toggle(series), Some(false));
        // No splice: the visible sequence is untouched.
        let after: Vec<RowId> = list.rows().map(|r| r.row_id()).collect();
        assert_eq!(before, after);

        // The flag took: expanding the author reveals the series collapsed.
        assert_eq!(list.toggle(author), Some(true));
        let rows: Vec<Row> = list.rows().collect();
        assert_eq!(rows.len(), 4); // author, series(collapsed), "No Series", leaf
        assert!(matches!(&rows[1], Row::Header { expanded: false, .. }));

        // And toggling it back while hidden works the same way.
        assert_eq!(list.toggle(author), Some(false));
        assert_eq!(list.toggle(series), Some(true));
        assert_eq!(list.toggle(author), Some(true));
        assert_eq!(list.count(), 5);
    }

    #[test]
    fn test_nested_collapse_is_remembered() {
        let books = vec![
            Book::new(1, "Foundation")
                .with_author(Author::new("Isaac Asimov"))
                .with_series(crate::record::Series::new("Foundation")),
            Book::new(2, "Nightfall").with_author(Author::new("Isaac Asimov")),
        ];
        let mut list = build(
            &books,
            &GroupingSpec::new([GroupKind::Author, GroupKind::Series]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();

        // Collapse the inner "Foundation" series header, then the author.
        let series = header_id(&list, "Foundation");
        let author = header_id(&list, "Asimov");
        assert_eq!(list.toggle(series), Some(false));
        assert_eq!(list.toggle(author), Some(false));
        assert_eq!(list.count(), 1);

        // Re-expanding the author keeps the series collapsed.
        assert_eq!(list.toggle(author), Some(true));
        let rows: Vec<Row> = list.rows().collect();
        assert_eq!(rows.len(), 4); // author, series(collapsed), "No Series", leaf
        assert!(matches!(
            &rows[1],
            Row::Header { expanded: false, .. }
        ));
    }
}
