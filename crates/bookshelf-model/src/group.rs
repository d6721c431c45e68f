//! Grouping specification: which attributes partition the book list, and in
//! what order.
//!
//! A [`GroupingSpec`] is an ordered (possibly empty) sequence of
//! [`GroupLevel`]s. Each level classifies every book into exactly one group
//! per attribute value; multi-valued attributes (authors, bookshelves)
//! classify the book once per value, so a two-author book appears under both
//! authors. Missing values map to well-defined sentinel groups ("Unknown
//! Genre", "No Series") rather than being dropped.
//!
//! Reordering levels is a full specification change; nothing from a prior
//! grouping is reused.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::record::Book;

/// The grouping attributes a level can partition on.
///
/// One-to-one with the row kinds of the catalogue's list styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    /// By author sort name; one group entry per author credit.
    Author,
    /// By series name; books without a series fall under "No Series".
    Series,
    /// By genre.
    Genre,
    /// By publisher.
    Publisher,
    /// Read vs. unread.
    ReadStatus,
    /// By first letter of the sort title.
    TitleLetter,
    /// By language.
    Language,
    /// By year the record was added.
    DateAddedYear,
    /// By month the record was added.
    DateAddedMonth,
    /// By year the book was read.
    DateReadYear,
    /// By year of publication.
    DatePublishedYear,
    /// By month of publication.
    DatePublishedMonth,
    /// By star rating; unrated books fall under "Unrated".
    Rating,
    /// By bookshelf; one group entry per shelf.
    Bookshelf,
    /// By physical format (hardcover, paperback, ebook).
    Format,
    /// By physical location of the copy.
    Location,
    /// By who the book is loaned to; books at home fall under "Available".
    Loaned,
}

impl GroupKind {
    /// Human-readable name of the kind, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Author => "Author",
            Self::Series => "Series",
            Self::Genre => "Genre",
            Self::Publisher => "Publisher",
            Self::ReadStatus => "Read Status",
            Self::TitleLetter => "Title Letter",
            Self::Language => "Language",
            Self::DateAddedYear => "Date Added (Year)",
            Self::DateAddedMonth => "Date Added (Month)",
            Self::DateReadYear => "Date Read (Year)",
            Self::DatePublishedYear => "Date Published (Year)",
            Self::DatePublishedMonth => "Date Published (Month)",
            Self::Rating => "Rating",
            Self::Bookshelf => "Bookshelf",
            Self::Format => "Format",
            Self::Location => "Location",
            Self::Loaned => "Loaned",
        }
    }
}

/// One level of the grouping hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLevel {
    /// The attribute this level partitions on.
    pub kind: GroupKind,
}

impl GroupLevel {
    /// Creates a level for the given kind.
    pub fn new(kind: GroupKind) -> Self {
        Self { kind }
    }

    /// Resolves the group key(s) this level assigns to a book.
    ///
    /// Multi-valued levels (author, bookshelf) return one key per value.
    /// `sort_title` is the book's precomputed leaf sort key, needed by
    /// [`GroupKind::TitleLetter`].
    pub fn keys(&self, book: &Book, sort_title: &str) -> Result<Vec<GroupKey>> {
        match self.kind {
            GroupKind::Author => {
                if book.authors.is_empty() {
                    return Ok(vec![GroupKey::uniform("Unknown Author")]);
                }
                Ok(book
                    .authors
                    .iter()
                    .map(|a| {
                        let sort = if a.sort_name.is_empty() {
                            &a.name
                        } else {
                            &a.sort_name
                        };
                        GroupKey::uniform(sort)
                    })
                    .collect())
            }
            GroupKind::Series => Ok(vec![GroupKey::uniform(
                book.series.as_ref().map_or("No Series", |s| s.name.as_str()),
            )]),
            GroupKind::Genre => Ok(vec![GroupKey::uniform(
                book.genre.as_deref().unwrap_or("Unknown"),
            )]),
            GroupKind::Publisher => Ok(vec![GroupKey::uniform(
                book.publisher.as_deref().unwrap_or("Unknown"),
            )]),
            GroupKind::ReadStatus => Ok(vec![GroupKey::uniform(if book.read {
                "Read"
            } else {
                "Unread"
            })]),
            GroupKind::TitleLetter => {
                let letter = sort_title.graphemes(true).next().ok_or_else(|| {
                    Error::invalid_grouping(
                        self.kind.name(),
                        book.id.0,
                        "title is empty, no letter to group on",
                    )
                })?;
                Ok(vec![GroupKey::uniform(letter.to_uppercase())])
            }
            GroupKind::Language => Ok(vec![GroupKey::uniform(
                book.language.as_deref().unwrap_or("Unknown"),
            )]),
            GroupKind::DateAddedYear => Ok(vec![year_key(book.date_added)]),
            GroupKind::DateAddedMonth => Ok(vec![month_key(book.date_added)]),
            GroupKind::DateReadYear => Ok(vec![year_key(book.date_read)]),
            GroupKind::DatePublishedYear => Ok(vec![year_key(book.date_published)]),
            GroupKind::DatePublishedMonth => Ok(vec![month_key(book.date_published)]),
            GroupKind::Rating => match book.rating {
                None => Ok(vec![GroupKey::uniform("Unrated")]),
                Some(r) if r > 5 => Err(Error::invalid_grouping(
                    self.kind.name(),
                    book.id.0,
                    format!("rating {r} outside 0..=5"),
                )),
                Some(1) => Ok(vec![GroupKey::new("1", "1 star")]),
                Some(r) => Ok(vec![GroupKey::new(r.to_string(), format!("{r} stars"))]),
            },
            GroupKind::Bookshelf => {
                if book.bookshelves.is_empty() {
                    return Ok(vec![GroupKey::uniform("Default")]);
                }
                Ok(book
                    .bookshelves
                    .iter()
                    .map(|s| GroupKey::uniform(s))
                    .collect())
            }
            GroupKind::Format => Ok(vec![GroupKey::uniform(
                book.format.as_deref().unwrap_or("Unknown"),
            )]),
            GroupKind::Location => Ok(vec![GroupKey::uniform(
                book.location.as_deref().unwrap_or("Unknown"),
            )]),
            GroupKind::Loaned => Ok(vec![GroupKey::uniform(
                book.loaned_to.as_deref().unwrap_or("Available"),
            )]),
        }
    }
}

impl From<GroupKind> for GroupLevel {
    fn from(kind: GroupKind) -> Self {
        Self::new(kind)
    }
}

fn year_key(date: Option<chrono::NaiveDate>) -> GroupKey {
    match date {
        Some(d) => GroupKey::uniform(d.format("%Y").to_string()),
        None => GroupKey::uniform("Unknown"),
    }
}

fn month_key(date: Option<chrono::NaiveDate>) -> GroupKey {
    match date {
        Some(d) => GroupKey::new(d.format("%Y-%m").to_string(), d.format("%B %Y").to_string()),
        None => GroupKey::uniform("Unknown"),
    }
}

/// The value a level assigns to a book: a sort key driving collation order
/// plus the label shown on the group header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    /// Key used for ordering and for group identity (case-folded).
    pub sort: String,
    /// Header display label.
    pub label: String,
}

impl GroupKey {
    /// Creates a key with distinct sort key and label.
    pub fn new(sort: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            sort: sort.into(),
            label: label.into(),
        }
    }

    /// Creates a key whose label equals its sort key.
    pub fn uniform(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            sort: value.clone(),
            label: value,
        }
    }

    /// Case-folded form of the sort key, used for group identity.
    ///
    /// Two consecutive records belong to the same group iff their folded
    /// keys are equal; ordering between different keys is the collator's
    /// business.
    pub fn folded(&self) -> String {
        self.sort.to_lowercase()
    }
}

/// An ordered list of grouping levels plus leaf-sort options.
///
/// An empty specification is valid and means a flat list of books with no
/// headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSpec {
    /// Levels, outermost first.
    levels: Vec<GroupLevel>,
    /// Whether leading articles are moved to the end of sort titles
    /// ("The Hobbit" sorts as "Hobbit, The"). Off by default.
    #[serde(default)]
    reorder_title_articles: bool,
}

impl GroupingSpec {
    /// Creates a specification from levels, outermost first.
    pub fn new<I, L>(levels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<GroupLevel>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
            reorder_title_articles: false,
        }
    }

    /// Creates the degenerate specification: no grouping, flat leaf list.
    pub fn flat() -> Self {
        Self::new(std::iter::empty::<GroupLevel>())
    }

    /// Enables or disables leading-article reordering for sort titles.
    pub fn with_reordered_titles(mut self, reorder: bool) -> Self {
        self.reorder_title_articles = reorder;
        self
    }

    /// The levels, outermost first.
    pub fn levels(&self) -> &[GroupLevel] {
        &self.levels
    }

    /// Number of levels; zero for a flat list.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// `true` when the specification is the degenerate flat list.
    pub fn is_flat(&self) -> bool {
        self.levels.is_empty()
    }

    /// The leaf secondary sort key for a book: its title, article-adjusted
    /// when configured.
    pub fn sort_title(&self, book: &Book) -> String {
        let title = book.title.trim();
        if self.reorder_title_articles {
            reorder_articles(title)
        } else {
            title.to_owned()
        }
    }

    /// Resolves the full group path for a book: one list of keys per level.
    ///
    /// The outer `Vec` has one entry per level; multi-valued levels yield
    /// several keys at their position and the book occupies the cartesian
    /// product of the per-level keys.
    pub fn group_paths(&self, book: &Book, sort_title: &str) -> Result<Vec<Vec<GroupKey>>> {
        self.levels
            .iter()
            .map(|level| level.keys(book, sort_title))
            .collect()
    }
}

impl Default for GroupingSpec {
    fn default() -> Self {
        Self::flat()
    }
}

/// Moves a leading "The", "A" or "An" to the end: "The Hobbit" becomes
/// "Hobbit, The".
fn reorder_articles(title: &str) -> String {
    for article in ["The ", "A ", "An "] {
        // get() rather than slicing: a multi-byte first character must not
        // panic, it just never matches an ASCII article.
        let Some(prefix) = title.get(..article.len()) else {
            continue;
        };
        if title.len() > article.len() && prefix.eq_ignore_ascii_case(article) {
            let rest = title[article.len()..].trim_start();
            if !rest.is_empty() {
                return format!("{rest}, {}", prefix.trim_end());
            }
        }
    }
    title.to_owned()
}
