//! Core identifier types for domain entities.
//!
//! These newtype wrappers keep arXiv identifiers and mailbox UIDs from being
//! mixed up with the free text that surrounds them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL of an arXiv abstract page. The identifier is appended verbatim.
pub const ABS_URL_PREFIX: &str = "https://arxiv.org/abs/";

/// An arXiv submission identifier such as `2301.01234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArxivId(pub String);

impl ArxivId {
    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abstract page URL for this submission.
    pub fn abs_url(&self) -> String {
        format!("{}{}", ABS_URL_PREFIX, self.0)
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ArxivId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArxivId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// IMAP UID of a message in the selected mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageUid(pub u32);

impl fmt::Display for MessageUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MessageUid {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}
