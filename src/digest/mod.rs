//! Daily digest parsing and reformatting.
//!
//! This is the pure core of the relay: it turns the plain-text listing format
//! of an arXiv digest email into highlighted HTML. Nothing in here performs I/O
//! or reads ambient configuration; everything arrives as arguments.
//!
//! - [`extract_category`] decides whether a message is a daily digest
//! - [`reformat`] parses listings, applies a [`FilterConfig`](crate::domain::FilterConfig)
//!   and renders the HTML summary

mod category;
mod highlight;
mod reformatter;
mod render;
mod scanner;

pub use category::extract_category;
pub use highlight::{highlight_authors, highlight_keywords, BOLD_CLOSE, BOLD_OPEN};
pub use reformatter::{reformat, ReformatResult};
pub use render::DigestStats;
pub use scanner::{parse_listings, ListingField};

#[cfg(test)]
pub(crate) use scanner::fixtures;

use crate::domain::ArxivId;

/// Result type alias for digest operations.
pub type Result<T> = std::result::Result<T, DigestError>;

/// Errors raised when a digest does not have the expected listing shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    /// No abstract link for the listing was found before the end of the text.
    #[error("listing arXiv:{identifier} has no abstract link before the end of the digest")]
    UnconfirmedListing {
        /// Identifier read after the `arXiv:` token.
        identifier: ArxivId,
    },

    /// A field marker is missing or out of order inside a listing.
    #[error("listing arXiv:{identifier} is missing its {field} field")]
    MissingField {
        /// Identifier of the malformed listing.
        identifier: ArxivId,
        /// The marker that could not be found.
        field: ListingField,
    },
}
