//! Mailbox provider implementations.
//!
//! This module contains the [`MailboxProvider`] trait and the IMAP/SMTP
//! implementation used in production:
//!
//! - [`ImapProvider`] - IMAP over TLS for reading, SMTP with STARTTLS for sending
//!
//! # Architecture
//!
//! The relay service drives a provider through one pass:
//!
//! - Authentication (username and app password)
//! - Searching the inbox for digest messages
//! - Fetching raw digests and sending reformatted ones
//! - Archiving or trashing processed messages
//!
//! # Example
//!
//! ```ignore
//! use arxiv_relay::providers::email::MailboxProvider;
//!
//! async fn count_digests(provider: &dyn MailboxProvider) -> usize {
//!     provider
//!         .search_digests()
//!         .await
//!         .map(|uids| uids.len())
//!         .unwrap_or_default()
//! }
//! ```

mod imap;
mod traits;

pub use imap::{ImapConfig, ImapCredentials, ImapProvider};
pub use traits::{MailboxProvider, OutgoingDigest, ProviderError, RawMessage, Result};
