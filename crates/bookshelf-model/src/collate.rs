//! Locale-aware collation for group keys and sort titles.
//!
//! Grouping and ordering are case-insensitive per the catalogue's collation
//! rules: "de la Mare" and "De La Mare" fall in the same group, and accented
//! names sort where the locale says they should, not where their code points
//! land.

use std::cmp::Ordering;

use icu::collator::options::{CollatorOptions, Strength};
use icu::collator::{Collator, CollatorBorrowed};
use icu::locale::Locale;

/// A locale-aware, case-insensitive string comparator.
///
/// Wraps an ICU collator at secondary strength (case differences ignored,
/// accents significant). Falls back to English collation when the requested
/// locale cannot be parsed or has no collation data.
pub struct Collation {
    locale: Locale,
    collator: CollatorBorrowed<'static>,
}

impl Collation {
    /// Creates a collation for a BCP 47 locale identifier (e.g. "en-US",
    /// "de-DE", "sv").
    pub fn new(locale: &str) -> Self {
        let locale: Locale = locale.parse().unwrap_or_else(|_| "en".parse().unwrap());

        let collator = Collator::try_new(locale.clone().into(), options()).unwrap_or_else(|_| {
            let fallback: Locale = "en".parse().unwrap();
            Collator::try_new(fallback.into(), options())
                .expect("en collation data is always compiled in")
        });

        Self { locale, collator }
    }

    /// Compares two strings under this collation.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }

    /// Returns the locale identifier in use.
    pub fn locale(&self) -> String {
        self.locale.to_string()
    }
}

fn options() -> CollatorOptions {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Secondary);
    options
}

impl Default for Collation {
    fn default() -> Self {
        Self::new("en")
    }
}

impl std::fmt::Debug for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collation")
            .field("locale", &self.locale.to_string())
            .finish()
    }
}
