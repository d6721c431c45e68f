//! The typed book record consumed by the engine.
//!
//! Records are immutable from the engine's point of view: the engine never
//! writes them back, it only groups and displays them. The schema is fixed
//! and typed rather than a string-keyed bag, so grouping attributes are
//! resolved once per specification instead of per comparison.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable identifier of a book record, owned by the external data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One author credit on a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Display name, e.g. "J.R.R. Tolkien".
    pub name: String,
    /// Name used for sorting and grouping, e.g. "Tolkien, J.R.R.".
    ///
    /// Empty means: derive "Last, Rest" from `name`.
    pub sort_name: String,
}

impl Author {
    /// Creates an author whose sort name is derived from the display name
    /// ("J.R.R. Tolkien" becomes "Tolkien, J.R.R.").
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let sort_name = derive_sort_name(&name);
        Self { name, sort_name }
    }

    /// Creates an author with an explicit sort name.
    pub fn with_sort_name(name: impl Into<String>, sort_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_name: sort_name.into(),
        }
    }
}

/// Moves the last whitespace-separated word to the front: "Isaac Asimov"
/// becomes "Asimov, Isaac". Single-word names are used as-is.
fn derive_sort_name(name: &str) -> String {
    match name.trim().rsplit_once(' ') {
        Some((rest, last)) => format!("{last}, {rest}"),
        None => name.trim().to_owned(),
    }
}

/// A series membership, e.g. "Discworld #4".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Series title.
    pub name: String,
    /// Position within the series, free-form ("4", "1.5", "omnibus").
    pub number: Option<String>,
}

impl Series {
    /// Creates a series membership without a number.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: None,
        }
    }

    /// Creates a numbered series membership.
    pub fn numbered(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: Some(number.into()),
        }
    }
}

/// A leaf record: one book with the attributes used for grouping and display.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// Stable record id.
    pub id: BookId,
    /// Display title.
    pub title: String,
    /// All author credits; a book appears once per author when grouped by
    /// author.
    pub authors: Vec<Author>,
    /// Optional series membership.
    pub series: Option<Series>,
    /// Genre, if known.
    pub genre: Option<String>,
    /// Publisher, if known.
    pub publisher: Option<String>,
    /// ISO 639 language name or code, if known.
    pub language: Option<String>,
    /// Whether the book has been read.
    pub read: bool,
    /// Rating in 0..=5 stars, if rated.
    pub rating: Option<u8>,
    /// Bookshelves the book sits on; a book appears once per shelf when
    /// grouped by bookshelf.
    pub bookshelves: Vec<String>,
    /// Physical format (hardcover, paperback, ebook), if known.
    pub format: Option<String>,
    /// Physical location of the copy, if tracked.
    pub location: Option<String>,
    /// Who the book is currently loaned to, if anyone.
    pub loaned_to: Option<String>,
    /// Date the record was added to the catalogue.
    pub date_added: Option<NaiveDate>,
    /// Date the book was finished, if read.
    pub date_read: Option<NaiveDate>,
    /// Date of publication.
    pub date_published: Option<NaiveDate>,
}

impl Book {
    /// Creates a book with the given id and title; all other attributes
    /// empty. Use the `with_*` methods to fill in the rest.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: BookId(id),
            title: title.into(),
            authors: Vec::new(),
            series: None,
            genre: None,
            publisher: None,
            language: None,
            read: false,
            rating: None,
            bookshelves: Vec::new(),
            format: None,
            location: None,
            loaned_to: None,
            date_added: None,
            date_read: None,
            date_published: None,
        }
    }

    /// Adds an author credit.
    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    /// Sets the series membership.
    pub fn with_series(mut self, series: Series) -> Self {
        self.series = Some(series);
        self
    }

    /// Sets the genre.
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Sets the publisher.
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Sets the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Marks the book read.
    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    /// Sets the rating (0..=5; validated when grouping by rating).
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Adds a bookshelf.
    pub fn with_bookshelf(mut self, shelf: impl Into<String>) -> Self {
        self.bookshelves.push(shelf.into());
        self
    }

    /// Sets the physical format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the physical location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Records who the book is loaned to.
    pub fn with_loaned_to(mut self, borrower: impl Into<String>) -> Self {
        self.loaned_to = Some(borrower.into());
        self
    }

    /// Sets the date the record was added.
    pub fn with_date_added(mut self, date: NaiveDate) -> Self {
        self.date_added = Some(date);
        self
    }

    /// Sets the date the book was read.
    pub fn with_date_read(mut self, date: NaiveDate) -> Self {
        self.date_read = Some(date);
        self
    }

    /// Sets the date of publication.
    pub fn with_date_published(mut self, date: NaiveDate) -> Self {
        self.date_published = Some(date);
        self
    }
}
