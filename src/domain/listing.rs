//! Listing domain types.
//!
//! A listing is one submission entry inside a daily digest.

use serde::{Deserialize, Serialize};

use super::ArxivId;

/// One parsed submission from a digest, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// arXiv identifier of the submission.
    pub identifier: ArxivId,
    /// Title text, possibly containing highlight markup.
    pub title: String,
    /// Author list as free text, possibly containing highlight markup.
    pub authors: String,
    /// Listed here as a secondary category.
    pub is_cross_listing: bool,
    /// Announcement of a revised version.
    pub is_replacement: bool,
    /// At least one configured author matched.
    pub is_marked: bool,
    /// At least one configured title keyword matched.
    pub has_keyword: bool,
    /// Matched a skip-word and is neither marked nor keyworded.
    pub is_skipped: bool,
}

impl ListingRecord {
    /// Creates an unflagged record from extracted fields.
    pub fn new(
        identifier: impl Into<ArxivId>,
        title: impl Into<String>,
        authors: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            authors: authors.into(),
            is_cross_listing: false,
            is_replacement: false,
            is_marked: false,
            has_keyword: false,
            is_skipped: false,
        }
    }

    /// Whether the listing revisits an earlier announcement.
    pub fn is_update(&self) -> bool {
        self.is_replacement || self.is_cross_listing
    }

    /// Whether a mark or keyword filter selected this listing.
    pub fn is_selected(&self) -> bool {
        self.is_marked || self.has_keyword
    }

    /// Annotation shown after the listing number, if any.
    pub fn annotation(&self) -> Option<&'static str> {
        match (self.is_cross_listing, self.is_replacement) {
            (true, true) => Some("(cross-listing, revised version)"),
            (false, true) => Some("(revised version)"),
            (true, false) => Some("(cross-listing)"),
            (false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_no_flags() {
        let record = ListingRecord::new("2301.01234", "A Title", "Ann Author");
        assert!(!record.is_update());
        assert!(!record.is_selected());
        assert!(!record.is_skipped);
        assert_eq!(record.annotation(), None);
    }

    #[test]
    fn annotation_combines_flags() {
        let mut record = ListingRecord::new("2301.01234", "A Title", "Ann Author");
        record.is_cross_listing = true;
        assert_eq!(record.annotation(), Some("(cross-listing)"));

        record.is_replacement = true;
        assert_eq!(record.annotation(), Some("(cross-listing, revised version)"));

        record.is_cross_listing = false;
        assert_eq!(record.annotation(), Some("(revised version)"));
        assert!(record.is_update());
    }

    #[test]
    fn selected_by_keyword_alone() {
        let mut record = ListingRecord::new("2301.01234", "A Title", "Ann Author");
        record.has_keyword = true;
        assert!(record.is_selected());
    }
}
