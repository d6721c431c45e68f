//! Hierarchical list materialization for a book catalogue.
//!
//! This crate turns a flat set of book records plus an ordered grouping
//! specification into a flattened sequence of group headers and leaf rows,
//! the structure a catalogue UI pages through. It provides:
//!
//! - [`GroupingSpec`]: which attributes partition the list, outermost first
//! - [`build`] / [`Session`]: construction of the node graph and visible list
//! - [`BooklistCursor`]: a random-access, snapshot read view for a UI adapter
//! - [`ExpandState`]: per-header expand/collapse flags with partial rebuilds
//!
//! The engine is a pure in-memory library: it performs no I/O, holds no
//! global state, and spawns no threads. Fetching records is the caller's
//! business; persistence of grouping and expand preferences is supported
//! through `serde` but performed by the caller.
//!
//! # Example
//!
//! ```
//! use bookshelf_model::{
//!     Author, Book, Collation, GroupKind, GroupingSpec, Row, Session,
//! };
//!
//! let books = vec![
//!     Book::new(1, "Watership Down").with_author(Author::new("Richard Adams")),
//!     Book::new(2, "The Plague Dogs").with_author(Author::new("Richard Adams")),
//!     Book::new(3, "Sundiver").with_author(Author::new("David Brin")),
//! ];
//!
//! let session = Session::open(
//!     GroupingSpec::new([GroupKind::Author]),
//!     Collation::new("en"),
//!     &books,
//! )?;
//!
//! let cursor = session.cursor();
//! assert_eq!(cursor.count(), 5); // two headers, three books
//!
//! // Collapse the first group in response to a tap on its header.
//! if let Row::Header { row_id, .. } = cursor.get(0)? {
//!     assert_eq!(session.toggle(row_id), Some(false));
//! }
//! assert_eq!(session.cursor().count(), 3);
//! # Ok::<(), bookshelf_model::Error>(())
//! ```

mod builder;
mod collate;
mod cursor;
mod error;
mod expand;
mod group;
mod list;
mod node;
mod record;
mod session;

pub use builder::{build, sort_records};
pub use collate::Collation;
pub use cursor::BooklistCursor;
pub use error::{Error, Result};
pub use expand::ExpandState;
pub use group::{GroupKey, GroupKind, GroupLevel, GroupingSpec};
pub use list::Booklist;
pub use node::{KeyPath, Row, RowId};
pub use record::{Author, Book, BookId, Series};
pub use session::{RebuildToken, Session};
