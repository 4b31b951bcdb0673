//! Listing boundary detection and field extraction.
//!
//! A digest body is a loose sequence of listings. Each one opens with an
//! `arXiv:<id>` token and closes with a link to its abstract page:
//!
//! ```text
//! arXiv:2301.00001
//! Date: Mon, 2 Jan 2023 10:00:00 GMT   (12kb)
//!
//! Title: Graph Neural Networks
//! Authors: John Smith, Jane Doe
//! Categories: cs.LG
//! \\
//!   Abstract text, which may itself mention arXiv:2101.00002 ...
//! \\ ( https://arxiv.org/abs/2301.00001 ,  12kb)
//! ```
//!
//! An `arXiv:` token is only a real boundary when the abstract link for its
//! identifier follows before the next boundary. Tokens that fail this check
//! are mentions inside the previous listing and are folded into it.

use std::fmt;

use crate::domain::{ArxivId, ListingRecord};

use super::{DigestError, Result};

/// Token that opens every listing.
pub const LISTING_MARKER: &str = "arXiv:";

/// Number of characters read after [`LISTING_MARKER`] as the identifier.
const IDENTIFIER_LEN: usize = 10;

const CROSS_LISTING_TAG: &str = "(*cross-listing*)";
const REPLACEMENT_TAG: &str = "replaced with revised version";

/// Named field markers inside a listing, in the order they must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    /// `Title: `
    Title,
    /// `Authors: `
    Authors,
    /// `Categories: `
    Categories,
}

impl ListingField {
    /// Literal marker text that introduces the field.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Title => "Title: ",
            Self::Authors => "Authors: ",
            Self::Categories => "Categories: ",
        }
    }
}

impl fmt::Display for ListingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "Title",
            Self::Authors => "Authors",
            Self::Categories => "Categories",
        };
        f.write_str(name)
    }
}

/// Text of one confirmed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingSpan<'a> {
    identifier: ArxivId,
    text: &'a str,
}

/// Parses every listing in a digest body, in order of appearance.
///
/// Titles and author lists have their line wrapping collapsed to single
/// spaces. Flags other than cross-listing and replacement are left unset.
///
/// # Errors
///
/// Returns [`DigestError::UnconfirmedListing`] when a listing's abstract link
/// never appears, and [`DigestError::MissingField`] when a confirmed listing
/// lacks one of its field markers.
pub fn parse_listings(body: &str) -> Result<Vec<ListingRecord>> {
    listing_spans(body)?
        .into_iter()
        .map(|span| parse_span(&span))
        .collect()
}

/// Splits the body into confirmed listing spans.
fn listing_spans(body: &str) -> Result<Vec<ListingSpan<'_>>> {
    let mut bounds: Vec<usize> = body
        .match_indices(LISTING_MARKER)
        .map(|(at, _)| at)
        .collect();
    bounds.push(body.len());

    let mut spans = Vec::with_capacity(bounds.len() - 1);
    let mut current = 0;
    while current + 1 < bounds.len() {
        let start = bounds[current];
        let identifier = read_identifier(body, start);
        let link = identifier.abs_url();

        // Fold boundaries into this listing until its abstract link is inside.
        let mut next = current + 1;
        while !body[start..bounds[next]].contains(&link) {
            if next + 1 == bounds.len() {
                return Err(DigestError::UnconfirmedListing { identifier });
            }
            tracing::trace!(%identifier, at = bounds[next], "folding spurious listing boundary");
            next += 1;
        }

        spans.push(ListingSpan {
            identifier,
            text: &body[start..bounds[next]],
        });
        current = next;
    }

    Ok(spans)
}

/// Reads the identifier that follows the listing marker at `start`.
fn read_identifier(body: &str, start: usize) -> ArxivId {
    body[start + LISTING_MARKER.len()..]
        .chars()
        .take(IDENTIFIER_LEN)
        .filter(|c| *c != '\r')
        .collect::<String>()
        .into()
}

/// Forward-only cursor over the field markers of one listing.
struct FieldCursor<'a> {
    span: &'a ListingSpan<'a>,
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(span: &'a ListingSpan<'a>) -> Self {
        Self { span, pos: 0 }
    }

    /// Advances past the next occurrence of `field`, returning where it began.
    fn seek(&mut self, field: ListingField) -> Result<usize> {
        let marker = field.marker();
        let at = self.span.text[self.pos..]
            .find(marker)
            .map(|offset| self.pos + offset)
            .ok_or_else(|| DigestError::MissingField {
                identifier: self.span.identifier.clone(),
                field,
            })?;
        self.pos = at + marker.len();
        Ok(at)
    }

    /// Returns the text of `field`, which runs up to the start of `next`.
    fn field(&mut self, field: ListingField, next: ListingField) -> Result<&'a str> {
        self.seek(field)?;
        let from = self.pos;
        let to = self.seek(next)?;
        // Leave the cursor on `next` so it can be read as the following field.
        self.pos = to;
        Ok(&self.span.text[from..to])
    }
}

fn parse_span(span: &ListingSpan<'_>) -> Result<ListingRecord> {
    let mut cursor = FieldCursor::new(span);
    let title = cursor.field(ListingField::Title, ListingField::Authors)?;
    let authors = cursor.field(ListingField::Authors, ListingField::Categories)?;

    let mut record = ListingRecord::new(
        span.identifier.clone(),
        collapse_whitespace(title),
        collapse_whitespace(authors),
    );
    record.is_cross_listing = span.text.contains(CROSS_LISTING_TAG);
    record.is_replacement = span.text.contains(REPLACEMENT_TAG);
    Ok(record)
}

/// Joins wrapped field lines into one line with single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for digest text in the CRLF layout arXiv sends.

    /// One listing in digest layout.
    pub struct Listing {
        pub id: &'static str,
        pub title: &'static str,
        pub authors: &'static str,
        pub cross_listing: bool,
        pub replacement: bool,
        pub abstract_text: &'static str,
    }

    impl Listing {
        pub fn new(id: &'static str, title: &'static str, authors: &'static str) -> Self {
            Self {
                id,
                title,
                authors,
                cross_listing: false,
                replacement: false,
                abstract_text: "We study a problem and report results.",
            }
        }

        pub fn cross_listing(mut self) -> Self {
            self.cross_listing = true;
            self
        }

        pub fn replacement(mut self) -> Self {
            self.replacement = true;
            self
        }

        pub fn with_abstract(mut self, abstract_text: &'static str) -> Self {
            self.abstract_text = abstract_text;
            self
        }

        pub fn render(&self) -> String {
            let mut text = String::from(
                "------------------------------------------------------------------------------\r\n\\\\\r\n",
            );
            text.push_str(&format!("arXiv:{}", self.id));
            if self.cross_listing {
                text.push_str(" (*cross-listing*)");
            }
            text.push_str("\r\n");
            if self.replacement {
                text.push_str("replaced with revised version Tue, 3 Jan 2023 10:00:00 GMT   (20kb)\r\n");
            } else {
                text.push_str("Date: Mon, 2 Jan 2023 10:00:00 GMT   (12kb)\r\n");
            }
            text.push_str("\r\n");
            text.push_str(&format!("Title: {}\r\n", self.title));
            text.push_str(&format!("Authors: {}\r\n", self.authors));
            text.push_str("Categories: cs.LG cs.AI\r\n");
            text.push_str("Comments: 10 pages\r\n\\\\\r\n");
            text.push_str(&format!("  {}\r\n", self.abstract_text));
            text.push_str(&format!(
                "\\\\ ( https://arxiv.org/abs/{} ,  12kb)\r\n",
                self.id
            ));
            text
        }
    }

    /// Renders a complete digest message with headers.
    pub fn digest(category: &str, listings: &[Listing]) -> String {
        let mut text = format!(
            "Date: Tue, 3 Jan 2023 01:02:03 +0000\r\nFrom: no-reply@arxiv.org\r\nSubject: {} daily Subj-class mailing 100 1\r\n\r\n",
            category
        );
        text.push_str("------------------------------------------------------------------------------\r\n");
        text.push_str("Send any comments regarding submissions directly to submitter.\r\n");
        text.push_str(&format!(
            "To unsubscribe, e-mail To: {}@arXiv.org, Subject: cancel\r\n",
            category
        ));
        for listing in listings {
            text.push_str(&listing.render());
        }
        text.push_str("%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%\r\n");
        text
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{digest, Listing};
    use super::*;

    #[test]
    fn parses_listings_in_order() {
        let body = digest(
            "cs",
            &[
                Listing::new("2301.00001", "First Paper", "Ann Author"),
                Listing::new("2301.00002", "Second Paper", "Bob Writer, Cy Scribe"),
            ],
        );

        let records = parse_listings(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, ArxivId::from("2301.00001"));
        assert_eq!(records[0].title, "First Paper");
        assert_eq!(records[0].authors, "Ann Author");
        assert_eq!(records[1].identifier, ArxivId::from("2301.00002"));
        assert_eq!(records[1].authors, "Bob Writer, Cy Scribe");
    }

    #[test]
    fn detects_cross_listing_and_replacement() {
        let body = digest(
            "cs",
            &[
                Listing::new("2301.00001", "Plain", "Ann Author"),
                Listing::new("2301.00002", "Crossed", "Ann Author").cross_listing(),
                Listing::new("2201.00003", "Revised", "Ann Author").replacement(),
                Listing::new("2201.00004", "Both", "Ann Author")
                    .cross_listing()
                    .replacement(),
            ],
        );

        let records = parse_listings(&body).unwrap();
        let flags: Vec<_> = records
            .iter()
            .map(|r| (r.is_cross_listing, r.is_replacement))
            .collect();
        assert_eq!(
            flags,
            vec![(false, false), (true, false), (false, true), (true, true)]
        );
    }

    #[test]
    fn folds_mentions_inside_abstracts() {
        let body = digest(
            "cs",
            &[
                Listing::new("2301.00001", "Follow-up Work", "Ann Author")
                    .with_abstract("This extends arXiv:2101.99999 and arXiv:2102.88888 results."),
                Listing::new("2301.00002", "Next Paper", "Bob Writer"),
            ],
        );

        let records = parse_listings(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Follow-up Work");
        assert_eq!(records[1].identifier, ArxivId::from("2301.00002"));
    }

    #[test]
    fn collapses_wrapped_lines() {
        let body = digest(
            "cs",
            &[Listing::new(
                "2301.00001",
                "A Very Long Title That\r\n  Wraps Onto Two Lines",
                "Ann Author, Bob\r\n  Writer",
            )],
        );

        let records = parse_listings(&body).unwrap();
        assert_eq!(records[0].title, "A Very Long Title That Wraps Onto Two Lines");
        assert_eq!(records[0].authors, "Ann Author, Bob Writer");
    }

    #[test]
    fn strips_carriage_returns_from_identifier() {
        // A short old-style token runs into the line break.
        let body = "arXiv:2301.0001\r\nTitle: T\r\nAuthors: A\r\nCategories: cs\r\n https://arxiv.org/abs/2301.0001\n";
        let records = parse_listings(body).unwrap();
        assert_eq!(records[0].identifier, ArxivId::from("2301.0001"));
    }

    #[test]
    fn digest_without_listings_is_empty() {
        let body = digest("cs", &[]);
        assert!(parse_listings(&body).unwrap().is_empty());
    }

    #[test]
    fn missing_abstract_link_is_an_error() {
        let body = "arXiv:2301.00001\r\nTitle: T\r\nAuthors: A\r\nCategories: cs\r\n";
        let err = parse_listings(body).unwrap_err();
        assert_eq!(
            err,
            DigestError::UnconfirmedListing {
                identifier: ArxivId::from("2301.00001")
            }
        );
    }

    #[test]
    fn missing_authors_marker_is_an_error() {
        let body = "arXiv:2301.00001\r\nTitle: T\r\nCategories: cs\r\n( https://arxiv.org/abs/2301.00001 )";
        let err = parse_listings(body).unwrap_err();
        assert_eq!(
            err,
            DigestError::MissingField {
                identifier: ArxivId::from("2301.00001"),
                field: ListingField::Authors,
            }
        );
    }

    #[test]
    fn out_of_order_markers_are_an_error() {
        let body = "arXiv:2301.00001\r\nCategories: cs\r\nTitle: T\r\nAuthors: A\r\n( https://arxiv.org/abs/2301.00001 )";
        let err = parse_listings(body).unwrap_err();
        assert!(matches!(
            err,
            DigestError::MissingField {
                field: ListingField::Categories,
                ..
            }
        ));
    }

    #[test]
    fn field_display_names() {
        assert_eq!(ListingField::Title.to_string(), "Title");
        assert_eq!(ListingField::Categories.marker(), "Categories: ");
    }
}
