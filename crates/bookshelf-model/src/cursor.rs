//! Random-access read view over a built list.
//!
//! A cursor is an immutable snapshot: it keeps the `Booklist` it was taken
//! from alive and is unaffected by later toggles or rebuilds on the
//! session. A UI thread can therefore page through it while a rebuild is in
//! flight, and takes a fresh cursor when it wants the new list.

use std::sync::Arc;

use crate::error::Result;
use crate::list::Booklist;
use crate::node::{Row, RowId};

/// An index-addressable snapshot of the flattened list.
#[derive(Debug, Clone)]
pub struct BooklistCursor {
    snapshot: Arc<Booklist>,
}

impl BooklistCursor {
    pub(crate) fn new(snapshot: Arc<Booklist>) -> Self {
        Self { snapshot }
    }

    /// Number of visible rows. O(1).
    pub fn count(&self) -> usize {
        self.snapshot.count()
    }

    /// The row at `position`; [`Error::PositionOutOfRange`] outside
    /// `[0, count())`. O(1).
    ///
    /// [`Error::PositionOutOfRange`]: crate::Error::PositionOutOfRange
    pub fn get(&self, position: usize) -> Result<Row> {
        self.snapshot.row(position)
    }

    /// The visible position of a row id, or `None` when the row is hidden
    /// or gone. A stale id is an expected condition, not an error; callers
    /// restoring a scroll anchor fall back to position 0.
    pub fn position_of(&self, row_id: RowId) -> Option<usize> {
        self.snapshot.position_of(row_id)
    }

    /// Iterates over all visible rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.snapshot.rows()
    }
}
