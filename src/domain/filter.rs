//! Filter configuration applied to a digest.

use serde::{Deserialize, Serialize};

/// Highlight and skip rules for one digest category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Author names to highlight, e.g. `"John Smith"`.
    pub mark_authors: Vec<String>,
    /// Title keywords to highlight.
    pub mark_keywords: Vec<String>,
    /// Title substrings that cause a listing to be dropped.
    pub skip_words: Vec<String>,
    /// Only keep listings selected by an author or keyword.
    pub marked_only: bool,
}

impl FilterConfig {
    /// Returns the configured authors split into name tokens.
    pub fn author_names(&self) -> Vec<AuthorName<'_>> {
        self.mark_authors
            .iter()
            .map(|author| AuthorName::parse(author))
            .collect()
    }
}

/// A configured author reduced to its first and last tokens.
///
/// Middle names are ignored: `"John Q. Smith"` becomes `John` / `Smith`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorName<'a> {
    /// The configured name as written.
    pub full: &'a str,
    /// First space-separated token.
    pub first: &'a str,
    /// Last space-separated token.
    pub last: &'a str,
}

impl<'a> AuthorName<'a> {
    /// Splits a configured author name into tokens.
    pub fn parse(full: &'a str) -> Self {
        let first = full.split(' ').next().unwrap_or_default();
        let last = full.rsplit(' ').next().unwrap_or_default();
        Self { full, first, last }
    }

    /// Whether a first-name token from the digest refers to this author.
    ///
    /// Accepts the configured first name itself or its initial followed by a
    /// period, both compared case-insensitively.
    pub fn first_name_matches(&self, candidate: &str) -> bool {
        if candidate.eq_ignore_ascii_case(self.first) {
            return true;
        }
        match self.first.chars().next() {
            Some(initial) => {
                let mut abbreviated = candidate.chars();
                matches!(
                    (abbreviated.next(), abbreviated.next(), abbreviated.next()),
                    (Some(c), Some('.'), None) if c.to_lowercase().eq(initial.to_lowercase())
                )
            }
            None => false,
        }
    }

    /// Whether a given name read from a surname-first entry (`"Smith, John"`)
    /// refers to this author.
    ///
    /// Accepts whatever [`first_name_matches`](Self::first_name_matches) does.
    /// A configured initial such as `"J."` also accepts any given name that
    /// starts with that letter.
    pub fn given_name_matches(&self, candidate: &str) -> bool {
        if self.first_name_matches(candidate) {
            return true;
        }
        match (self.initial(), candidate.chars().next()) {
            (Some(initial), Some(c)) => c.to_lowercase().eq(initial.to_lowercase()),
            _ => false,
        }
    }

    /// The configured initial when the first name is written as `"J."`.
    fn initial(&self) -> Option<char> {
        let mut chars = self.first.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(c), Some('.'), None) if c.is_alphabetic() => Some(c),
            _ => None,
        }
    }
}
