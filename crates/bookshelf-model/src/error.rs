//! Error types for the booklist engine.

/// Result type alias for booklist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reading a booklist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A grouping level could not classify a record.
    ///
    /// Surfaced synchronously from a build; the previous list (if any)
    /// stays in place and nothing half-built is ever exposed.
    #[error("grouping level '{level}' cannot classify book {book_id}: {message}")]
    InvalidGrouping {
        /// Name of the offending level.
        level: String,
        /// Id of the record that could not be classified.
        book_id: u64,
        /// What went wrong.
        message: String,
    },

    /// A cursor position outside `[0, count())` was requested.
    ///
    /// This is a programming error at the call site, not a recoverable
    /// runtime condition.
    #[error("position {position} out of range (count is {count})")]
    PositionOutOfRange { position: usize, count: usize },

    /// The session was invalidated while a rebuild was in flight.
    ///
    /// The rebuild's result has been discarded; the caller should restart
    /// from the session's current grouping if it still wants a list.
    #[error("rebuild abandoned: session was invalidated")]
    RebuildAbandoned,
}

impl Error {
    /// Create an `InvalidGrouping` error.
    pub fn invalid_grouping(
        level: impl Into<String>,
        book_id: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidGrouping {
            level: level.into(),
            book_id,
            message: message.into(),
        }
    }
}
