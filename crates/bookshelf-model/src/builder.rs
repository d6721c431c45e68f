//! List construction: records + grouping specification -> node graph.
//!
//! Construction is a single linear pass over entry rows sorted by the full
//! group-path + leaf order. An entry row is one (group path, book)
//! occurrence; multi-valued levels expand a book into one entry per value,
//! the same way the catalogue's store emits one row per author credit for a
//! multi-author book. The pass keeps a stack of currently open headers, one
//! per level, closing stale levels and opening new headers whenever a
//! level's key changes. Cost is O(N log N) for the ordering plus O(N) for
//! the pass, independent of group count.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::collate::Collation;
use crate::error::Result;
use crate::expand::ExpandState;
use crate::group::{GroupKey, GroupingSpec};
use crate::list::Booklist;
use crate::node::{HeaderNode, KeyPath, LeafNode, NodeData, NodeIndex};
use crate::record::{Book, BookId};

/// One book occurrence with its resolved group path.
struct Entry<'a> {
    /// One key per level.
    path: Vec<GroupKey>,
    /// Case-folded sort keys, precomputed for group identity checks.
    folded: Vec<String>,
    /// Leaf secondary sort key.
    sort_title: String,
    book: &'a Book,
}

/// Builds the node graph and initial flattened list for `records` under
/// `spec`, applying `expand` to decide initial header states.
///
/// Records may arrive in any order; the builder derives per-value entry rows
/// and establishes the total order itself (collation per level, then leaf
/// sort title, then record id). Fails with [`Error::InvalidGrouping`] when a
/// level cannot classify a record; nothing partial is returned.
///
/// [`Error::InvalidGrouping`]: crate::Error::InvalidGrouping
pub fn build(
    records: &[Book],
    spec: &GroupingSpec,
    expand: &ExpandState,
    collation: &Collation,
) -> Result<Booklist> {
    let mut entries = Vec::with_capacity(records.len());
    for book in records {
        let sort_title = spec.sort_title(book);
        let per_level = spec.group_paths(book, &sort_title)?;
        for path in cartesian(&per_level) {
            let folded = path.iter().map(GroupKey::folded).collect();
            entries.push(Entry {
                path,
                folded,
                sort_title: sort_title.clone(),
                book,
            });
        }
    }

    entries.sort_by(|a, b| compare_entries(a, b, collation));
    // A book credited twice with the same value (duplicate author rows in
    // the source) would otherwise materialize the same leaf twice.
    entries.dedup_by(|a, b| a.book.id == b.book.id && a.folded == b.folded);

    let mut nodes: Vec<NodeData> = Vec::new();
    let mut roots: Vec<NodeIndex> = Vec::new();
    // Open headers, outermost first; stack[i] is the current group at level i.
    let mut stack: Vec<NodeIndex> = Vec::new();

    for entry in &entries {
        // Keep the common prefix of the open header stack.
        let mut common = 0;
        while common < stack.len() {
            let open = header(&nodes, stack[common]);
            if open.key_path.segments()[common] == entry.folded[common] {
                common += 1;
            } else {
                break;
            }
        }
        stack.truncate(common);

        // Open a new header for every level below the common prefix.
        for level in common..spec.depth() {
            let parent_path = match stack.last() {
                Some(&parent) => header(&nodes, parent).key_path.clone(),
                None => KeyPath::root(),
            };
            let key_path = parent_path.child(&entry.folded[level]);
            let row_id = key_path.header_row_id();
            let idx = NodeIndex(nodes.len());
            nodes.push(NodeData::Header(HeaderNode {
                row_id,
                level,
                key_path,
                label: entry.path[level].label.clone(),
                book_count: 0,
                expanded: expand.is_expanded(row_id),
                children: Vec::new(),
            }));
            match stack.last() {
                Some(&parent) => header_mut(&mut nodes, parent).children.push(idx),
                None => roots.push(idx),
            }
            stack.push(idx);
        }

        // Attach the leaf under the innermost header (or at the root for a
        // flat specification).
        let parent_path = match stack.last() {
            Some(&parent) => header(&nodes, parent).key_path.clone(),
            None => KeyPath::root(),
        };
        let idx = NodeIndex(nodes.len());
        nodes.push(NodeData::Leaf(LeafNode {
            row_id: parent_path.leaf_row_id(entry.book.id),
            book_id: entry.book.id,
            title: entry.book.title.clone(),
        }));
        match stack.last() {
            Some(&parent) => header_mut(&mut nodes, parent).children.push(idx),
            None => roots.push(idx),
        }
        for &open in &stack {
            header_mut(&mut nodes, open).book_count += 1;
        }
    }

    debug!(
        records = records.len(),
        entries = entries.len(),
        nodes = nodes.len(),
        levels = spec.depth(),
        "booklist built"
    );

    Ok(Booklist::from_arena(nodes, roots))
}

fn header<'a>(nodes: &'a [NodeData], idx: NodeIndex) -> &'a HeaderNode {
    match &nodes[idx.0] {
        NodeData::Header(h) => h,
        // The stack only ever holds header indices.
        NodeData::Leaf(_) => unreachable!("leaf on the open-header stack"),
    }
}

fn header_mut<'a>(nodes: &'a mut [NodeData], idx: NodeIndex) -> &'a mut HeaderNode {
    match &mut nodes[idx.0] {
        NodeData::Header(h) => h,
        NodeData::Leaf(_) => unreachable!("leaf on the open-header stack"),
    }
}

/// Total order over entries: per level, collator order on the sort keys with
/// folded-key bytes as a tie-break (so collator-equal but distinct groups
/// never interleave), then the leaf sort title, then the record id.
fn compare_entries(a: &Entry<'_>, b: &Entry<'_>, collation: &Collation) -> Ordering {
    for level in 0..a.path.len() {
        match collation.compare(&a.path[level].sort, &b.path[level].sort) {
            Ordering::Equal => match a.folded[level].cmp(&b.folded[level]) {
                Ordering::Equal => {}
                fold => return fold,
            },
            ord => return ord,
        }
    }
    collation
        .compare(&a.sort_title, &b.sort_title)
        .then_with(|| a.book.id.cmp(&b.book.id))
}

/// Cartesian product of per-level keys. With no multi-valued levels this is
/// exactly one path; with an empty specification it is one empty path.
fn cartesian(per_level: &[Vec<GroupKey>]) -> Vec<Vec<GroupKey>> {
    let mut paths: Vec<Vec<GroupKey>> = vec![Vec::new()];
    for keys in per_level {
        let mut next = Vec::with_capacity(paths.len() * keys.len());
        for path in &paths {
            for key in keys {
                let mut extended = Vec::with_capacity(path.len() + 1);
                extended.extend_from_slice(path);
                extended.push(key.clone());
                next.push(extended);
            }
        }
        paths = next;
    }
    paths
}

/// Sorts records in place by the leaf order of `spec`: outermost group key
/// first (the first value of multi-valued levels), then sort title, then id.
///
/// Convenience for callers presenting a flat list; [`build`] establishes its
/// own order and does not require pre-sorted input.
pub fn sort_records(
    collation: &Collation,
    spec: &GroupingSpec,
    records: &mut [Book],
) -> Result<()> {
    let mut keys: HashMap<BookId, (Vec<String>, String)> = HashMap::with_capacity(records.len());
    for book in records.iter() {
        let sort_title = spec.sort_title(book);
        let per_level = spec.group_paths(book, &sort_title)?;
        let firsts = per_level.iter().map(|level| level[0].sort.clone()).collect();
        keys.insert(book.id, (firsts, sort_title));
    }
    records.sort_by(|a, b| {
        let (path_a, title_a) = &keys[&a.id];
        let (path_b, title_b) = &keys[&b.id];
        for (x, y) in path_a.iter().zip(path_b) {
            match collation.compare(x, y) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        collation
            .compare(title_a, title_b)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupKind;
    use crate::record::Author;

    fn shelf() -> Vec<Book> {
        vec![
            Book::new(1, "Watership Down").with_author(Author::new("Richard Adams")),
            Book::new(2, "The Plague Dogs").with_author(Author::new("Richard Adams")),
            Book::new(3, "Sundiver").with_author(Author::new("David Brin")),
        ]
    }

    #[test]
    fn test_build_by_author() {
        let list = build(
            &shelf(),
            &GroupingSpec::new([GroupKind::Author]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();

        let labels: Vec<String> = list
            .rows()
            .map(|row| match row {
                crate::node::Row::Header { label, book_count, .. } => {
                    format!("{label} ({book_count})")
                }
                crate::node::Row::Book { title, .. } => title,
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                "Adams, Richard (2)",
                "The Plague Dogs",
                "Watership Down",
                "Brin, David (1)",
                "Sundiver",
            ]
        );
    }

    #[test]
    fn test_flat_build_is_title_order() {
        let list = build(
            &shelf(),
            &GroupingSpec::flat(),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();

        let ids: Vec<u64> = list
            .rows()
            .map(|row| match row {
                crate::node::Row::Book { book_id, .. } => book_id.0,
                crate::node::Row::Header { .. } => panic!("flat list has no headers"),
            })
            .collect();
        // Sundiver, The Plague Dogs, Watership Down.
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_multi_author_book_appears_twice() {
        let mut books = shelf();
        books.push(
            Book::new(4, "Good Omens")
                .with_author(Author::new("Terry Pratchett"))
                .with_author(Author::new("Neil Gaiman")),
        );
        let list = build(
            &books,
            &GroupingSpec::new([GroupKind::Author]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();

        let occurrences: Vec<crate::node::RowId> = list
            .rows()
            .filter_map(|row| match row {
                crate::node::Row::Book { row_id, book_id, .. } if book_id.0 == 4 => Some(row_id),
                _ => None,
            })
            .collect();
        assert_eq!(occurrences.len(), 2);
        // Same record, two parents, two distinct row ids.
        assert_ne!(occurrences[0], occurrences[1]);
    }

    #[test]
    fn test_duplicate_credit_dedups() {
        let books = vec![
            Book::new(1, "Twice Credited")
                .with_author(Author::new("Ann Doubled"))
                .with_author(Author::new("Ann Doubled")),
        ];
        let list = build(
            &books,
            &GroupingSpec::new([GroupKind::Author]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();
        // One header, one leaf.
        assert_eq!(list.count(), 2);
    }

    #[test]
    fn test_invalid_grouping_aborts_build() {
        let books = vec![Book::new(1, "Fine"), Book::new(2, "Broken").with_rating(99)];
        let err = build(
            &books,
            &GroupingSpec::new([GroupKind::Rating]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InvalidGrouping { book_id: 2, .. }
        ));
    }

    #[test]
    fn test_two_level_grouping() {
        let books = vec![
            Book::new(1, "Foundation")
                .with_author(Author::new("Isaac Asimov"))
                .with_series(crate::record::Series::new("Foundation")),
            Book::new(2, "Nightfall").with_author(Author::new("Isaac Asimov")),
        ];
        let list = build(
            &books,
            &GroupingSpec::new([GroupKind::Author, GroupKind::Series]),
            &ExpandState::default(),
            &Collation::default(),
        )
        .unwrap();

        let rows: Vec<(usize, String)> = list
            .rows()
            .map(|row| match row {
                crate::node::Row::Header { level, label, .. } => (level, label),
                crate::node::Row::Book { title, .. } => (usize::MAX, title),
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "Asimov, Isaac".to_string()),
                (1, "Foundation".to_string()),
                (usize::MAX, "Foundation".to_string()),
                (1, "No Series".to_string()),
                (usize::MAX, "Nightfall".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_records_flat() {
        let mut books = shelf();
        sort_records(&Collation::default(), &GroupingSpec::flat(), &mut books).unwrap();
        let ids: Vec<u64> = books.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
