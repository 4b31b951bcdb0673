//! Mailbox provider trait definition.
//!
//! This module defines the [`MailboxProvider`] trait which abstracts over the
//! mail transport the relay talks to. The relay service only ever sees this
//! trait, so tests can drive a full pass against an in-memory mailbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use serde::{Deserialize, Serialize};

use crate::domain::MessageUid;

/// Result type alias for mailbox provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur during mailbox provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or the provider is not logged in.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network, TLS, or protocol error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Requested message was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// A message as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Server UID of the message.
    pub uid: MessageUid,
    /// Full message text, headers and body, line endings preserved.
    pub text: String,
    /// Parsed `Date` header in UTC.
    pub date: Option<DateTime<Utc>>,
}

impl RawMessage {
    /// Builds a message from the raw RFC 5322 bytes of a fetch.
    pub fn parse(uid: MessageUid, bytes: &[u8]) -> Self {
        let date = MessageParser::default()
            .parse(bytes)
            .and_then(|message| message.date().map(|d| d.to_timestamp()))
            .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0));

        Self {
            uid,
            text: String::from_utf8_lossy(bytes).into_owned(),
            date,
        }
    }

    /// Day of the mailing as used in relayed subjects, e.g. `03 Jan 2023`.
    pub fn mailing_day(&self) -> Option<String> {
        self.date.map(|date| date.format("%d %b %Y").to_string())
    }
}

/// A reformatted digest ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingDigest {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Recipient addresses.
    pub recipients: Vec<String>,
}

/// Access to the mailbox holding arXiv digests.
///
/// Implementations keep one authenticated session for the whole relay pass.
/// All operations other than [`authenticate`](Self::authenticate) fail with
/// [`ProviderError::Authentication`] before login.
///
/// # Example
///
/// ```ignore
/// async fn newest(provider: &impl MailboxProvider) -> Result<Option<RawMessage>> {
///     match provider.search_digests().await?.last() {
///         Some(uid) => provider.fetch_message(*uid).await.map(Some),
///         None => Ok(None),
///     }
/// }
/// ```
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    /// Logs in and opens the inbox.
    async fn authenticate(&mut self) -> Result<()>;

    /// Returns the UIDs of every message from the digest sender, oldest first.
    async fn search_digests(&self) -> Result<Vec<MessageUid>>;

    /// Fetches one message without marking it as seen.
    async fn fetch_message(&self, uid: MessageUid) -> Result<RawMessage>;

    /// Sends an HTML digest from the logged-in account.
    ///
    /// Returns the server's response message for logging.
    async fn send_digest(&self, digest: &OutgoingDigest) -> Result<String>;

    /// Removes a message from the inbox, leaving it in the archive.
    async fn archive(&self, uid: MessageUid) -> Result<()>;

    /// Moves a message to the trash.
    async fn trash(&self, uid: MessageUid) -> Result<()>;

    /// Closes the inbox and ends the session.
    async fn logout(&mut self) -> Result<()>;
}
