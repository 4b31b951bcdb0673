//! Domain layer types for the arXiv digest relay.
//!
//! This module contains the core domain types shared by the digest parser,
//! the configuration layer, and the relay service: listing records, filter
//! rules, and the identifier newtypes.

mod filter;
mod listing;
mod types;

pub use filter::{AuthorName, FilterConfig};
pub use listing::ListingRecord;
pub use types::{ArxivId, MessageUid, ABS_URL_PREFIX};
