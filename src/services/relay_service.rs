//! Relay service for reformatting and forwarding daily digests.
//!
//! The [`RelayService`] drives one pass over the inbox: every message from the
//! digest sender is fetched, categorized, reformatted with the category's
//! filters, sent to the selected recipients, and archived.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::digest::{extract_category, reformat};
use crate::domain::MessageUid;
use crate::providers::email::{MailboxProvider, OutgoingDigest, RawMessage, Result};

/// Result of one relay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReport {
    /// Digests reformatted, sent, and archived.
    pub relayed: usize,
    /// Messages from the digest sender that are not daily digests.
    pub not_digests: usize,
    /// Digests left in the inbox because they could not be parsed.
    pub malformed: usize,
    /// Per-message errors (non-fatal).
    pub errors: Vec<String>,
    /// Duration of the pass.
    pub duration_ms: u64,
}

impl RelayReport {
    /// Returns true if every digest in the pass was relayed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What happened to a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Disposition {
    Relayed,
    NotDigest,
    Malformed(String),
}

/// Orchestrates relay passes against a mailbox provider.
pub struct RelayService {
    settings: Arc<Settings>,
}

impl RelayService {
    /// Creates a new relay service.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Returns the settings used by this service.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs one pass over every digest currently in the inbox.
    ///
    /// The UID list is taken once at the start, so messages left in place
    /// (malformed digests) are not revisited within the pass. Any provider
    /// error aborts the pass, since the mailbox state is then unknown.
    pub async fn run_once<P>(&self, provider: &P) -> Result<RelayReport>
    where
        P: MailboxProvider + ?Sized,
    {
        let start = std::time::Instant::now();
        let uids = provider.search_digests().await?;
        let mut report = RelayReport::default();

        for uid in uids {
            match self.relay_message(provider, uid).await? {
                Disposition::Relayed => report.relayed += 1,
                Disposition::NotDigest => report.not_digests += 1,
                Disposition::Malformed(error) => {
                    report.malformed += 1;
                    report.errors.push(format!("message {}: {}", uid, error));
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            relayed = report.relayed,
            not_digests = report.not_digests,
            malformed = report.malformed,
            duration_ms = report.duration_ms,
            "Relay pass complete"
        );
        Ok(report)
    }

    async fn relay_message<P>(&self, provider: &P, uid: MessageUid) -> Result<Disposition>
    where
        P: MailboxProvider + ?Sized,
    {
        let message = provider.fetch_message(uid).await?;
        let trash_fetched = self.settings.relay.trash_fetched;

        let Some(category) = extract_category(&message.text) else {
            tracing::info!(uid = %uid, "Message is not a daily arXiv digest");
            if trash_fetched {
                provider.trash(uid).await?;
            }
            return Ok(Disposition::NotDigest);
        };

        let profile = self.settings.profile_for(category);
        let result = match reformat(&message.text, category, &profile.filters) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(uid = %uid, category, error = %e, "Leaving malformed digest in inbox");
                return Ok(Disposition::Malformed(e.to_string()));
            }
        };

        let digest = OutgoingDigest {
            subject: subject_line(category, &message),
            html: result.html,
            recipients: self.settings.recipients_for(category, result.any_marked),
        };
        provider.send_digest(&digest).await?;

        provider.archive(uid).await?;
        if trash_fetched {
            provider.trash(uid).await?;
        }

        tracing::info!(
            uid = %uid,
            category,
            date = ?message.date,
            listings = result.stats.total,
            skipped = result.stats.skipped,
            any_marked = result.any_marked,
            recipients = digest.recipients.len(),
            "Relayed digest"
        );
        Ok(Disposition::Relayed)
    }
}

/// `cs arXiv, 03 Jan 2023`, dated by the digest's own `Date` header.
fn subject_line(category: &str, message: &RawMessage) -> String {
    let day = message
        .mailing_day()
        .unwrap_or_else(|| Utc::now().format("%d %b %Y").to_string());
    format!("{} arXiv, {}", category, day)
}
