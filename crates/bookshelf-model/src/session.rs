//! A list-builder session: one grouping, one expand state, one current
//! snapshot.
//!
//! All mutation funnels through the session and swaps in a complete new
//! snapshot atomically; readers hold [`BooklistCursor`] snapshots and never
//! observe a half-built list. A failed rebuild leaves the previous snapshot
//! in place. Rebuild results race a generation counter: any mutation bumps
//! it, and a rebuild started against an older generation is discarded on
//! completion instead of swapped in.
//!
//! Changing the grouping specification is a full change by contract; open a
//! new session for it.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::builder::build;
use crate::collate::Collation;
use crate::cursor::BooklistCursor;
use crate::error::{Error, Result};
use crate::expand::ExpandState;
use crate::group::GroupingSpec;
use crate::list::Booklist;
use crate::node::RowId;
use crate::record::Book;

struct State {
    list: Arc<Booklist>,
    expand: ExpandState,
    generation: u64,
}

/// Owns the node graph and flattened list for one grouping session.
pub struct Session {
    spec: GroupingSpec,
    collation: Collation,
    state: RwLock<State>,
}

impl Session {
    /// Builds the initial list and opens the session, all headers expanded.
    pub fn open(spec: GroupingSpec, collation: Collation, records: &[Book]) -> Result<Self> {
        Self::open_with_state(spec, collation, ExpandState::default(), records)
    }

    /// Opens a session with a previously persisted expand state, so a
    /// returning caller sees the groups the way it left them.
    pub fn open_with_state(
        spec: GroupingSpec,
        collation: Collation,
        expand: ExpandState,
        records: &[Book],
    ) -> Result<Self> {
        let list = build(records, &spec, &expand, &collation)?;
        debug!(levels = spec.depth(), rows = list.count(), "session opened");
        Ok(Self {
            spec,
            collation,
            state: RwLock::new(State {
                list: Arc::new(list),
                expand,
                generation: 0,
            }),
        })
    }

    /// The grouping specification this session was opened with.
    pub fn grouping(&self) -> &GroupingSpec {
        &self.spec
    }

    /// The collation in use.
    pub fn collation(&self) -> &Collation {
        &self.collation
    }

    /// A snapshot cursor over the current list. Cheap; take a fresh one
    /// after any mutation to see its effect.
    pub fn cursor(&self) -> BooklistCursor {
        BooklistCursor::new(self.state.read().list.clone())
    }

    /// The current expand state, for persistence by the caller.
    pub fn expand_state(&self) -> ExpandState {
        self.state.read().expand.clone()
    }

    /// Toggles a header and records the new state.
    ///
    /// A partial operation: only the header's descendant run is spliced;
    /// the record source is not consulted. Headers hidden under a collapsed
    /// ancestor still flip, taking effect when the ancestor expands.
    /// Returns the new expanded flag, or `None` for a stale or non-header
    /// row id.
    pub fn toggle(&self, header: RowId) -> Option<bool> {
        let mut state = self.state.write();
        // Copy-on-write: in-place when no cursor holds the snapshot.
        let list = Arc::make_mut(&mut state.list);
        let expanded = list.toggle(header)?;
        state.expand.set(header, expanded);
        state.generation += 1;
        Some(expanded)
    }

    /// Expands every header, one recomputation of the visible sequence.
    pub fn expand_all(&self) {
        self.set_all(true);
    }

    /// Collapses every header, one recomputation of the visible sequence.
    pub fn collapse_all(&self) {
        self.set_all(false);
    }

    fn set_all(&self, expanded: bool) {
        let mut state = self.state.write();
        Arc::make_mut(&mut state.list).set_all_expanded(expanded);
        state.expand.set_all(expanded);
        state.generation += 1;
    }

    /// Rebuilds the list from a fresh record set, preserving the session's
    /// expand state (row ids are stable, so surviving headers keep their
    /// flags).
    ///
    /// Equivalent to [`begin_rebuild`](Self::begin_rebuild) followed
    /// immediately by [`finish_rebuild`](Self::finish_rebuild).
    pub fn rebuild(&self, records: &[Book]) -> Result<()> {
        let token = self.begin_rebuild();
        self.finish_rebuild(token, records)
    }

    /// Captures the state a rebuild must be computed against.
    ///
    /// For a background rebuild, take the token on the caller's thread,
    /// ship it to the worker together with the fresh records, and commit
    /// with [`finish_rebuild`](Self::finish_rebuild).
    pub fn begin_rebuild(&self) -> RebuildToken {
        let state = self.state.read();
        RebuildToken {
            generation: state.generation,
            expand: state.expand.clone(),
        }
    }

    /// Builds against a token and swaps the result in atomically.
    ///
    /// The build runs outside the state lock. If the session was mutated
    /// after the token was taken (a toggle, another rebuild, or
    /// [`invalidate`](Self::invalidate)), the result is stale and is
    /// discarded with [`Error::RebuildAbandoned`]. On build failure the
    /// previous list stays in place unchanged; nothing half-built is ever
    /// exposed.
    pub fn finish_rebuild(&self, token: RebuildToken, records: &[Book]) -> Result<()> {
        let list = build(records, &self.spec, &token.expand, &self.collation)?;

        let mut state = self.state.write();
        if state.generation != token.generation {
            debug!(
                started_at = token.generation,
                current = state.generation,
                "stale rebuild discarded"
            );
            return Err(Error::RebuildAbandoned);
        }
        state.list = Arc::new(list);
        state.generation += 1;
        Ok(())
    }

    /// Marks the session stale: any in-flight rebuild's result will be
    /// discarded on completion. Use when the caller navigates away while a
    /// background rebuild is running.
    pub fn invalidate(&self) {
        self.state.write().generation += 1;
    }
}

/// Capture of the session state a rebuild runs against; see
/// [`Session::begin_rebuild`].
#[derive(Debug, Clone)]
pub struct RebuildToken {
    generation: u64,
    expand: ExpandState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Session")
            .field("levels", &self.spec.depth())
            .field("rows", &state.list.count())
            .field("generation", &state.generation)
            .finish()
    }
}
