//! Digest category detection from the raw message header.

const SUBJECT_MARKER: &str = "Subject: ";
const DAILY_MARKER: &str = " daily";

/// Returns the subject category of a daily digest, e.g. `"cs"`.
///
/// The label is the text between the first `"Subject: "` and the following
/// `" daily"`, returned verbatim. Messages lacking either marker are not
/// daily digests and yield `None`.
pub fn extract_category(raw: &str) -> Option<&str> {
    let start = raw.find(SUBJECT_MARKER)? + SUBJECT_MARKER.len();
    let len = raw[start..].find(DAILY_MARKER)?;
    Some(&raw[start..start + len])
}
