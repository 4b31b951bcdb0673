//! Author and keyword highlighting.
//!
//! Matches are case-insensitive over ASCII, which keeps byte offsets of the
//! lowered text aligned with the original. Highlighted spans are wrapped in
//! [`BOLD_OPEN`]/[`BOLD_CLOSE`]; a span that is already wrapped is left alone,
//! so running a pass twice produces the same markup.
//!
//! The text is already HTML-escaped when it arrives here. A match never starts
//! or ends inside an entity such as `&amp;`, and never touches a tag.

use std::ops::Range;

use crate::domain::{AuthorName, ListingRecord};

/// Opening highlight tag.
pub const BOLD_OPEN: &str = "<b>";
/// Closing highlight tag.
pub const BOLD_CLOSE: &str = "</b>";

const AUTHOR_SEPARATOR: &str = ", ";

/// Highlights configured authors in the record's author list.
///
/// Sets `is_marked` when any author matches and returns the indices of the
/// configured names that matched, in configured order.
pub fn highlight_authors(record: &mut ListingRecord, names: &[AuthorName<'_>]) -> Vec<usize> {
    let mut hits = Vec::new();
    for (index, name) in names.iter().enumerate() {
        if let Some(span) = find_author(&record.authors, name) {
            wrap_once(&mut record.authors, span);
            hits.push(index);
        }
    }
    if !hits.is_empty() {
        record.is_marked = true;
    }
    hits
}

/// Highlights the first occurrence of each configured keyword in the title.
///
/// Sets `has_keyword` when any keyword matches and returns the indices of the
/// keywords that matched, in configured order.
pub fn highlight_keywords(record: &mut ListingRecord, keywords: &[String]) -> Vec<usize> {
    let mut hits = Vec::new();
    for (index, keyword) in keywords.iter().enumerate() {
        if let Some(at) = find_ignore_case(&record.title, keyword) {
            wrap_once(&mut record.title, at..at + keyword.len());
            hits.push(index);
        }
    }
    if !hits.is_empty() {
        record.has_keyword = true;
    }
    hits
}

/// Case-insensitive substring test, as used for skip-words.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    find_ignore_case(haystack, needle).is_some()
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    text_matches(haystack, needle).into_iter().next()
}

/// Byte offsets of every case-insensitive occurrence of `needle` that lies in
/// the text of `haystack` rather than in its markup.
fn text_matches(haystack: &str, needle: &str) -> Vec<usize> {
    let Some(step) = needle.chars().next().map(char::len_utf8) else {
        return Vec::new();
    };
    let lowered = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let classes = classify(haystack);

    let mut found = Vec::new();
    let mut from = 0;
    while let Some(offset) = lowered[from..].find(&needle) {
        let at = from + offset;
        if is_text_span(&classes, at..at + needle.len()) {
            found.push(at);
        }
        from = at + step;
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Text,
    Tag,
    EntityStart,
    EntityBody,
    EntityEnd,
}

/// Classifies each byte of escaped text as plain text, tag or entity.
fn classify(text: &str) -> Vec<ByteClass> {
    let bytes = text.as_bytes();
    let mut classes = vec![ByteClass::Text; bytes.len()];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                let end = text[i..].find('>').map_or(bytes.len(), |o| i + o + 1);
                classes[i..end].fill(ByteClass::Tag);
                i = end;
            }
            b'&' => match text[i..].find(';') {
                Some(o) => {
                    let end = i + o;
                    classes[i] = ByteClass::EntityStart;
                    classes[i + 1..end].fill(ByteClass::EntityBody);
                    classes[end] = ByteClass::EntityEnd;
                    i = end + 1;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    classes
}

/// Whether `span` covers text only, with any entity inside it taken whole.
fn is_text_span(classes: &[ByteClass], span: Range<usize>) -> bool {
    let inner = &classes[span];
    !inner.contains(&ByteClass::Tag)
        && !matches!(
            inner.first(),
            Some(ByteClass::EntityBody | ByteClass::EntityEnd)
        )
        && !matches!(
            inner.last(),
            Some(ByteClass::EntityStart | ByteClass::EntityBody)
        )
}

/// Locates the author group for `name`, from the start of the group (after
/// any existing highlight tag) through the end of the last name.
///
/// Each occurrence of the last name is tried in turn. The first-name token is
/// the first word of the comma-separated group holding the occurrence. When
/// the last name opens its group, the list is read as surname-first
/// (`"Smith, John"`) and the first word of the following group is used; a
/// configured initial then also accepts a full given name.
fn find_author(authors: &str, name: &AuthorName<'_>) -> Option<Range<usize>> {
    for at in text_matches(authors, name.last) {
        let end = at + name.last.len();
        let group_start = authors[..at]
            .rfind(AUTHOR_SEPARATOR)
            .map_or(0, |sep| sep + AUTHOR_SEPARATOR.len());
        let name_start = if authors[group_start..at].starts_with(BOLD_OPEN) {
            group_start + BOLD_OPEN.len()
        } else {
            group_start
        };

        let given = first_word(&authors[name_start..at]);
        let matched = if given.is_empty() {
            following_group(authors, end)
                .map(first_word)
                .is_some_and(|given| name.given_name_matches(given))
        } else {
            name.first_name_matches(given)
        };

        if matched {
            return Some(name_start..end);
        }
    }
    None
}

/// Returns the author group that follows the name ending at `end`.
fn following_group(authors: &str, end: usize) -> Option<&str> {
    let rest = &authors[end..];
    let rest = rest.strip_prefix(BOLD_CLOSE).unwrap_or(rest);
    rest.strip_prefix(AUTHOR_SEPARATOR)
        .map(|group| group.strip_prefix(BOLD_OPEN).unwrap_or(group))
}

fn first_word(text: &str) -> &str {
    text.split([' ', ',']).next().unwrap_or_default()
}

/// Wraps `span` in highlight tags unless it is wrapped already.
fn wrap_once(text: &mut String, span: Range<usize>) -> bool {
    if text[..span.start].ends_with(BOLD_OPEN) && text[span.end..].starts_with(BOLD_CLOSE) {
        return false;
    }
    text.insert_str(span.end, BOLD_CLOSE);
    text.insert_str(span.start, BOLD_OPEN);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, authors: &str) -> ListingRecord {
        ListingRecord::new("2301.00001", title, authors)
    }

    #[test]
    fn highlights_full_author_name() {
        let mut r = record("T", "Ann Author, John Smith, Bob Writer");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("John Smith")]);
        assert_eq!(hits, vec![0]);
        assert!(r.is_marked);
        assert_eq!(r.authors, "Ann Author, <b>John Smith</b>, Bob Writer");
    }

    #[test]
    fn matches_abbreviated_first_name() {
        let mut r = record("T", "J. Smith, Ann Author");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("John Smith")]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.authors, "<b>J. Smith</b>, Ann Author");
    }

    #[test]
    fn matches_surname_first_order() {
        let mut r = record("T", "Smith, John");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("John Smith")]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.authors, "<b>Smith</b>, John");
    }

    #[test]
    fn configured_initial_matches_surname_first_given_name() {
        let mut r = record("T", "Ann Author, Smith, John");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("J. Smith")]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.authors, "Ann Author, <b>Smith</b>, John");
    }

    #[test]
    fn configured_initial_needs_initial_in_given_first_order() {
        let mut r = record("T", "John Smith");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("J. Smith")]);
        assert!(hits.is_empty());

        let mut r = record("T", "J. Smith");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("J. Smith")]);
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn rejects_different_first_name() {
        let mut r = record("T", "Jane Smith, Ann Author");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("John Smith")]);
        assert!(hits.is_empty());
        assert!(!r.is_marked);
        assert_eq!(r.authors, "Jane Smith, Ann Author");
    }

    #[test]
    fn is_case_insensitive() {
        let mut r = record("T", "JOHN SMITH");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("john smith")]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.authors, "<b>JOHN SMITH</b>");
    }

    #[test]
    fn keeps_middle_names_inside_highlight() {
        let mut r = record("T", "Ann Author, John Q. Smith");
        highlight_authors(&mut r, &[AuthorName::parse("John Smith")]);
        assert_eq!(r.authors, "Ann Author, <b>John Q. Smith</b>");
    }

    #[test]
    fn tries_later_occurrences_of_the_last_name() {
        let mut r = record("T", "Jane Smith, John Smith");
        let hits = highlight_authors(&mut r, &[AuthorName::parse("John Smith")]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.authors, "Jane Smith, <b>John Smith</b>");
    }

    #[test]
    fn several_configured_authors() {
        let mut r = record("T", "Ada Lovelace, Ann Author, Alan Turing");
        let names = [
            AuthorName::parse("Alan Turing"),
            AuthorName::parse("Grace Hopper"),
            AuthorName::parse("Ada Lovelace"),
        ];
        let hits = highlight_authors(&mut r, &names);
        assert_eq!(hits, vec![0, 2]);
        assert_eq!(
            r.authors,
            "<b>Ada Lovelace</b>, Ann Author, <b>Alan Turing</b>"
        );
    }

    #[test]
    fn author_highlight_is_idempotent() {
        let mut r = record("T", "Ann Author, John Smith");
        let names = [AuthorName::parse("John Smith"), AuthorName::parse("J. Smith")];
        highlight_authors(&mut r, &names);
        let once = r.authors.clone();
        let hits = highlight_authors(&mut r, &names);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.authors, once);
        assert_eq!(r.authors.matches(BOLD_OPEN).count(), 1);
    }

    #[test]
    fn highlights_keyword_first_occurrence() {
        let mut r = record("Quantum walks and quantum games", "A");
        let hits = highlight_keywords(&mut r, &["quantum".to_string()]);
        assert_eq!(hits, vec![0]);
        assert!(r.has_keyword);
        assert_eq!(r.title, "<b>Quantum</b> walks and quantum games");
    }

    #[test]
    fn keyword_highlight_is_idempotent() {
        let mut r = record("Graph Neural Networks", "A");
        let keywords = vec!["neural".to_string()];
        highlight_keywords(&mut r, &keywords);
        highlight_keywords(&mut r, &keywords);
        assert_eq!(r.title, "Graph <b>Neural</b> Networks");
    }

    #[test]
    fn unmatched_keywords_leave_title() {
        let mut r = record("Graph Neural Networks", "A");
        let hits = highlight_keywords(&mut r, &["transformer".to_string(), String::new()]);
        assert!(hits.is_empty());
        assert!(!r.has_keyword);
        assert_eq!(r.title, "Graph Neural Networks");
    }

    #[test]
    fn keyword_skips_entity_text() {
        let mut r = record("Sparse &amp; AMP Recovery", "A");
        let hits = highlight_keywords(&mut r, &["AMP".to_string()]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.title, "Sparse &amp; <b>AMP</b> Recovery");
    }

    #[test]
    fn keyword_may_contain_a_whole_entity() {
        let mut r = record("Cats &amp; Dogs", "A");
        let hits = highlight_keywords(&mut r, &["&amp;".to_string()]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.title, "Cats <b>&amp;</b> Dogs");
    }

    #[test]
    fn keyword_never_matches_inside_a_tag() {
        let mut r = record("Graph Neural Networks", "A");
        let hits = highlight_keywords(&mut r, &["Neural".to_string(), "b".to_string()]);
        assert_eq!(hits, vec![0]);
        assert_eq!(r.title, "Graph <b>Neural</b> Networks");
    }

    #[test]
    fn text_matches_ignore_markup() {
        let text = "<b>amp</b> &amp; amp";
        assert_eq!(text_matches(text, "amp"), vec![3, 17]);
        assert_eq!(text_matches(text, "b"), Vec::<usize>::new());
        assert_eq!(text_matches("&lt;b&gt;", "lt"), Vec::<usize>::new());
    }

    #[test]
    fn contains_ignore_case_works() {
        assert!(contains_ignore_case("Graph Neural Networks", "networks"));
        assert!(!contains_ignore_case("Graph Neural Networks", "survey"));
        assert!(!contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Cats &amp; Dogs", "amp"));
    }
}
