//! Digest reformatting: parse, highlight, skip, filter and render.

use serde::Serialize;

use crate::domain::{FilterConfig, ListingRecord};

use super::highlight::{contains_ignore_case, highlight_authors, highlight_keywords};
use super::render::{html_escape, render_html, Summary};
use super::scanner::parse_listings;
use super::{DigestStats, Result};

/// Output of [`reformat`].
#[derive(Debug, Clone, Serialize)]
pub struct ReformatResult {
    /// Complete HTML document for the outgoing email.
    pub html: String,
    /// Whether any configured author appeared in the digest.
    pub any_marked: bool,
    /// Counts shown in the header.
    pub stats: DigestStats,
    /// Listings after the selection filter, in source order.
    pub listings: Vec<ListingRecord>,
}

/// Reformats the raw text of a digest into an HTML summary.
///
/// # Arguments
///
/// * `body` - raw message text, headers included, line endings as delivered
/// * `category` - label from [`extract_category`](super::extract_category)
/// * `config` - highlight and skip rules for this category
///
/// # Errors
///
/// Returns a [`DigestError`](super::DigestError) when the listings do not
/// have the expected shape. No partial output is produced in that case.
pub fn reformat(body: &str, category: &str, config: &FilterConfig) -> Result<ReformatResult> {
    let mut records = parse_listings(body)?;

    let names = config.author_names();
    // Titles are escaped before matching, so the match terms must be too.
    let keywords: Vec<String> = config.mark_keywords.iter().map(|k| html_escape(k)).collect();
    let skip_words: Vec<String> = config.skip_words.iter().map(|w| html_escape(w)).collect();

    let mut author_hits = vec![false; names.len()];
    let mut keyword_hits = vec![false; keywords.len()];
    let mut skip_counts = vec![0usize; skip_words.len()];

    for record in &mut records {
        record.title = html_escape(&record.title);
        record.authors = html_escape(&record.authors);

        for index in highlight_authors(record, &names) {
            author_hits[index] = true;
        }
        for index in highlight_keywords(record, &keywords) {
            keyword_hits[index] = true;
        }

        if !record.is_selected() {
            for (word, count) in skip_words.iter().zip(skip_counts.iter_mut()) {
                if contains_ignore_case(&record.title, word) {
                    record.is_skipped = true;
                    *count += 1;
                }
            }
        }
    }

    let any_marked = records.iter().any(|r| r.is_marked);
    let skipped = records.iter().filter(|r| r.is_skipped).count();
    let marked_positions = positions(&records, |r| r.is_marked);
    let keyword_positions = positions(&records, |r| r.has_keyword);

    if config.marked_only {
        records.retain(ListingRecord::is_selected);
    }

    let mut stats = DigestStats::from_records(&records);
    stats.skipped = skipped;

    let html = render_html(&Summary {
        category,
        records: &records,
        stats,
        skip_counts: config
            .skip_words
            .iter()
            .zip(&skip_counts)
            .filter(|(_, count)| **count > 0)
            .map(|(word, count)| (word.as_str(), *count))
            .collect(),
        marked_positions,
        keyword_positions,
        matched_authors: names
            .iter()
            .zip(&author_hits)
            .filter(|(_, hit)| **hit)
            .map(|(name, _)| name.full)
            .collect(),
        matched_keywords: config
            .mark_keywords
            .iter()
            .zip(&keyword_hits)
            .filter(|(_, hit)| **hit)
            .map(|(keyword, _)| keyword.as_str())
            .collect(),
        marked_only: config.marked_only,
    });

    tracing::debug!(
        category,
        total = stats.total,
        new = stats.new,
        updates = stats.updates,
        skipped = stats.skipped,
        any_marked,
        "reformatted digest"
    );

    Ok(ReformatResult {
        html,
        any_marked,
        stats,
        listings: records,
    })
}

/// 1-based positions of the records matching `predicate`.
fn positions(records: &[ListingRecord], predicate: impl Fn(&ListingRecord) -> bool) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| predicate(r))
        .map(|(index, _)| index + 1)
        .collect()
}
