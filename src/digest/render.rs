//! HTML rendering of a reformatted digest.

use serde::Serialize;

use crate::domain::ListingRecord;

const DOCUMENT_OPEN: &str = "<html>\n<head></head>\n<body>\n<p><br>\n";
const DOCUMENT_CLOSE: &str = "\n</p>\n</body>\n</html>\n";

/// Listing counts reported in the digest header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestStats {
    /// Listings in the rendered set.
    pub total: usize,
    /// Listings that are new submissions.
    pub new: usize,
    /// Listings that are replacements or cross-listings.
    pub updates: usize,
    /// Listings announcing a revised version.
    pub replacements: usize,
    /// Listings cross-listed from another category.
    pub cross_listings: usize,
    /// Listings dropped by skip-words, counted before any selection filter.
    pub skipped: usize,
}

impl DigestStats {
    /// Counts the listings of a rendered set. `skipped` is left at zero.
    pub fn from_records(records: &[ListingRecord]) -> Self {
        let total = records.len();
        let updates = records.iter().filter(|r| r.is_update()).count();
        Self {
            total,
            new: total - updates,
            updates,
            replacements: records.iter().filter(|r| r.is_replacement).count(),
            cross_listings: records.iter().filter(|r| r.is_cross_listing).count(),
            skipped: 0,
        }
    }
}

/// Everything the renderer needs from a processed digest.
#[derive(Debug)]
pub(crate) struct Summary<'a> {
    pub category: &'a str,
    /// Listings after the selection filter, in source order.
    pub records: &'a [ListingRecord],
    pub stats: DigestStats,
    /// Skip-words with a non-zero count, in configured order.
    pub skip_counts: Vec<(&'a str, usize)>,
    /// 1-based positions of marked listings.
    pub marked_positions: Vec<usize>,
    /// 1-based positions of keyworded listings.
    pub keyword_positions: Vec<usize>,
    /// Configured authors with at least one hit, in configured order.
    pub matched_authors: Vec<&'a str>,
    /// Configured keywords with at least one hit, in configured order.
    pub matched_keywords: Vec<&'a str>,
    pub marked_only: bool,
}

/// Renders the full HTML document for a digest.
pub(crate) fn render_html(summary: &Summary<'_>) -> String {
    let mut html = String::from(DOCUMENT_OPEN);
    html.push_str(&render_header(summary));
    html.push_str(&render_body(summary.records));
    html.push_str(DOCUMENT_CLOSE);
    html
}

fn render_header(summary: &Summary<'_>) -> String {
    let stats = &summary.stats;
    let mut header = format!(
        "Today's <b>{}</b> arXiv: {} new listings and {} updates ({} replacements + {} crossrefs). <br>\n",
        html_escape(summary.category),
        stats.new,
        stats.updates,
        stats.replacements,
        stats.cross_listings,
    );

    if stats.skipped > 0 {
        let counts = summary
            .skip_counts
            .iter()
            .map(|(word, count)| format!("{} with \"{}\"", count, html_escape(word)))
            .collect::<Vec<_>>()
            .join(", ");
        header.push_str(&format!(
            "Skipped {} listings: {}. <br>\n",
            stats.skipped, counts
        ));
    }

    if summary.marked_only {
        header.push_str("Only showing selected listings: <br>\n");
        if !summary.matched_authors.is_empty() {
            header.push_str(&format!(
                "* By {}. <br>\n",
                escape_join(&summary.matched_authors, "")
            ));
        }
        if !summary.matched_keywords.is_empty() {
            header.push_str(&format!(
                "* With {}. <br>\n",
                escape_join(&summary.matched_keywords, "\"")
            ));
        }
    } else {
        if !summary.marked_positions.is_empty() {
            header.push_str(&notice(
                &summary.marked_positions,
                "by",
                &escape_join(&summary.matched_authors, ""),
            ));
        }
        if !summary.keyword_positions.is_empty() {
            header.push_str(&notice(
                &summary.keyword_positions,
                "with",
                &escape_join(&summary.matched_keywords, ""),
            ));
        }
    }

    header
}

/// `Notice listing(s) Nr. 1, 4 by A, B. <br>`
fn notice(positions: &[usize], joiner: &str, names: &str) -> String {
    let noun = if positions.len() > 1 {
        "listings"
    } else {
        "listing"
    };
    let numbers = positions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Notice {} Nr. {} {} {}. <br>\n", noun, numbers, joiner, names)
}

fn escape_join(items: &[&str], quote: &str) -> String {
    items
        .iter()
        .map(|item| format!("{quote}{}{quote}", html_escape(item)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_body(records: &[ListingRecord]) -> String {
    let mut body = String::from("<br><br>\n");
    let count = records.len();
    for (index, record) in records.iter().enumerate() {
        if record.is_skipped {
            continue;
        }
        body.push_str(&format!("Title {} out of {}", index + 1, count));
        if let Some(annotation) = record.annotation() {
            body.push(' ');
            body.push_str(annotation);
        }
        body.push_str(&format!(
            "<br><b>{}</b><br>by {}<br>is at <a href=\"{}\">{}</a><br><br><br>\n",
            record.title,
            record.authors,
            record.identifier.abs_url(),
            record.identifier,
        ));
    }
    body
}

/// Simple HTML escaping for digest text.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
