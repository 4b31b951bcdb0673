//! IMAP/SMTP provider implementation.
//!
//! This module provides a [`MailboxProvider`] using standard IMAP for reading
//! the inbox and SMTP for sending relayed digests. The defaults target Gmail,
//! whose `X-GM-LABELS` extension is used to trash messages.
//!
//! # Protocol Details
//!
//! - Uses IMAP4rev1 (RFC 3501) via `async-imap` over implicit TLS
//! - Uses SMTP with STARTTLS via `lettre`
//! - Flags are only changed by explicit UID STORE commands; fetches use
//!   `BODY.PEEK[]` so unprocessed digests stay unread

use std::sync::Arc;

use async_imap::types::Fetch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use super::{MailboxProvider, OutgoingDigest, ProviderError, RawMessage, Result};
use crate::config::ServerSettings;
use crate::domain::MessageUid;

/// Flag change that removes a message from the Gmail inbox.
const ARCHIVE_STORE: &str = "+FLAGS (\\Deleted)";
/// Label change that moves a message to the Gmail trash.
const TRASH_STORE: &str = "+X-GM-LABELS (\\Trash)";

/// IMAP/SMTP configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapConfig {
    /// IMAP server hostname.
    pub imap_host: String,
    /// IMAP server port (implicit TLS).
    pub imap_port: u16,
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (STARTTLS).
    pub smtp_port: u16,
    /// Mailbox holding incoming digests.
    pub mailbox: String,
    /// Sender address digests are searched by.
    pub digest_sender: String,
}

impl ImapConfig {
    /// Creates a configuration from the server settings.
    pub fn from_settings(server: &ServerSettings) -> Self {
        Self {
            imap_host: server.imap_host.clone(),
            imap_port: server.imap_port,
            smtp_host: server.smtp_host.clone(),
            smtp_port: server.smtp_port,
            mailbox: "INBOX".to_string(),
            digest_sender: server.digest_sender.clone(),
        }
    }

    /// The `UID SEARCH` query matching digest messages.
    fn search_query(&self) -> String {
        format!("FROM \"{}\"", self.digest_sender.replace('"', ""))
    }
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self::from_settings(&ServerSettings::default())
    }
}

/// Login credentials, shared by IMAP and SMTP.
#[derive(Clone)]
pub struct ImapCredentials {
    /// Username (usually the email address).
    pub username: String,
    /// Password or app-specific password.
    pub password: String,
}

impl std::fmt::Debug for ImapCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Type alias for the IMAP session with TLS (using tokio-util compat layer).
type ImapSession = async_imap::Session<Compat<TlsStream<TcpStream>>>;

/// IMAP/SMTP mailbox provider.
///
/// # Example
///
/// ```ignore
/// use arxiv_relay::providers::email::{ImapConfig, ImapCredentials, ImapProvider, MailboxProvider};
///
/// let mut provider = ImapProvider::new(ImapConfig::default(), credentials);
/// provider.authenticate().await?;
/// let uids = provider.search_digests().await?;
/// ```
pub struct ImapProvider {
    /// Server configuration.
    config: ImapConfig,
    /// Login credentials.
    credentials: ImapCredentials,
    /// IMAP session (connected when authenticated).
    session: Option<Arc<Mutex<ImapSession>>>,
    /// SMTP transport (built when authenticated).
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl ImapProvider {
    /// Creates a new provider. Nothing is connected until
    /// [`authenticate`](MailboxProvider::authenticate) is called.
    pub fn new(config: ImapConfig, credentials: ImapCredentials) -> Self {
        Self {
            config,
            credentials,
            session: None,
            mailer: None,
        }
    }

    /// Returns whether the provider is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ImapConfig {
        &self.config
    }

    /// Establishes TLS connection to the IMAP server with futures compat wrapper.
    async fn connect_tls(&self) -> Result<Compat<TlsStream<TcpStream>>> {
        let tcp_stream = TcpStream::connect((self.config.imap_host.as_str(), self.config.imap_port))
            .await
            .map_err(|e| ProviderError::Connection(format!("TCP connect failed: {}", e)))?;

        let config = ClientConfig::builder()
            .with_root_certificates(RootCertStore::from_iter(
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
            ))
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(self.config.imap_host.clone())
            .map_err(|e| ProviderError::Connection(format!("invalid server name: {}", e)))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| ProviderError::Connection(format!("TLS handshake failed: {}", e)))?;

        Ok(tls_stream.compat())
    }

    fn session(&self) -> Result<Arc<Mutex<ImapSession>>> {
        self.session
            .clone()
            .ok_or_else(|| ProviderError::Authentication("not authenticated".to_string()))
    }

    /// Consumes a stream to completion.
    async fn drain_stream<T, E>(
        stream: impl futures::Stream<Item = std::result::Result<T, E>>,
    ) -> std::result::Result<(), E> {
        use futures::StreamExt;
        futures::pin_mut!(stream);
        while let Some(result) = stream.next().await {
            result?;
        }
        Ok(())
    }

    /// Applies a `UID STORE` to a single message.
    async fn store(&self, uid: MessageUid, query: &str) -> Result<()> {
        let session_arc = self.session()?;
        let mut session = session_arc.lock().await;

        let updates = session
            .uid_store(uid.to_string(), query)
            .await
            .map_err(|e| ProviderError::Connection(format!("STORE failed: {}", e)))?;
        Self::drain_stream(updates)
            .await
            .map_err(|e| ProviderError::Connection(format!("STORE stream: {}", e)))?;

        tracing::debug!(uid = %uid, query, "Stored message flags");
        Ok(())
    }

    /// Builds the outgoing RFC 5322 message for a digest.
    fn build_message(from: &str, digest: &OutgoingDigest) -> Result<Message> {
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid from address: {}", e)))?;

        let mut builder = Message::builder().from(from_mailbox).subject(&digest.subject);
        for recipient in &digest.recipients {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                ProviderError::InvalidRequest(format!("invalid recipient {}: {}", recipient, e))
            })?;
            builder = builder.to(mailbox);
        }

        builder
            .multipart(MultiPart::alternative().singlepart(SinglePart::html(digest.html.clone())))
            .map_err(|e| ProviderError::InvalidRequest(format!("failed to build message: {}", e)))
    }

    fn message_bytes(fetches: &[Fetch], uid: MessageUid) -> Option<&[u8]> {
        body_for_uid(fetches.iter().map(|fetch| (fetch.uid, fetch.body())), uid)
    }
}

/// Picks the body answering for `uid` out of `(uid, body)` fetch responses.
///
/// Responses for other messages, or without a UID, are ignored.
fn body_for_uid<'a>(
    responses: impl IntoIterator<Item = (Option<u32>, Option<&'a [u8]>)>,
    uid: MessageUid,
) -> Option<&'a [u8]> {
    responses
        .into_iter()
        .find(|(fetched, _)| *fetched == Some(uid.0))
        .and_then(|(_, body)| body)
}

#[async_trait]
impl MailboxProvider for ImapProvider {
    async fn authenticate(&mut self) -> Result<()> {
        let tls_stream = self.connect_tls().await?;
        let client = async_imap::Client::new(tls_stream);

        let mut session = client
            .login(&self.credentials.username, &self.credentials.password)
            .await
            .map_err(|e| ProviderError::Authentication(format!("IMAP login failed: {:?}", e.0)))?;

        session
            .select(&self.config.mailbox)
            .await
            .map_err(|e| ProviderError::Connection(format!("SELECT failed: {}", e)))?;

        let smtp_credentials = SmtpCredentials::new(
            self.credentials.username.clone(),
            self.credentials.password.clone(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| ProviderError::Connection(format!("SMTP relay error: {}", e)))?
            .credentials(smtp_credentials)
            .port(self.config.smtp_port)
            .build();

        self.session = Some(Arc::new(Mutex::new(session)));
        self.mailer = Some(mailer);

        tracing::info!(
            username = %self.credentials.username,
            host = %self.config.imap_host,
            "IMAP provider authenticated"
        );
        Ok(())
    }

    async fn search_digests(&self) -> Result<Vec<MessageUid>> {
        let session_arc = self.session()?;
        let mut session = session_arc.lock().await;

        let uids = session
            .uid_search(self.config.search_query())
            .await
            .map_err(|e| ProviderError::Connection(format!("SEARCH failed: {}", e)))?;

        let mut uid_list: Vec<MessageUid> = uids.into_iter().map(MessageUid::from).collect();
        uid_list.sort();

        tracing::debug!(count = uid_list.len(), "Found digest candidates");
        Ok(uid_list)
    }

    async fn fetch_message(&self, uid: MessageUid) -> Result<RawMessage> {
        let session_arc = self.session()?;
        let mut session = session_arc.lock().await;

        let fetches: Vec<Fetch> = session
            .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")
            .await
            .map_err(|e| ProviderError::Connection(format!("FETCH failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| ProviderError::Connection(format!("FETCH stream: {}", e)))?;

        let bytes = Self::message_bytes(&fetches, uid)
            .ok_or_else(|| ProviderError::NotFound(format!("message {}", uid)))?;

        Ok(RawMessage::parse(uid, bytes))
    }

    async fn send_digest(&self, digest: &OutgoingDigest) -> Result<String> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| ProviderError::Authentication("not authenticated".to_string()))?;

        let message = Self::build_message(&self.credentials.username, digest)?;

        let response = mailer
            .send(message)
            .await
            .map_err(|e| ProviderError::Connection(format!("SMTP send failed: {}", e)))?;

        let reply = response.message().collect::<Vec<_>>().join(" ");

        tracing::info!(
            subject = %digest.subject,
            recipients = digest.recipients.len(),
            "Digest sent via SMTP"
        );
        Ok(reply)
    }

    async fn archive(&self, uid: MessageUid) -> Result<()> {
        self.store(uid, ARCHIVE_STORE).await
    }

    async fn trash(&self, uid: MessageUid) -> Result<()> {
        self.store(uid, TRASH_STORE).await
    }

    async fn logout(&mut self) -> Result<()> {
        self.mailer = None;
        let Some(session_arc) = self.session.take() else {
            return Ok(());
        };
        let mut session = session_arc.lock().await;

        // CLOSE expunges the messages flagged \Deleted by archive().
        session
            .close()
            .await
            .map_err(|e| ProviderError::Connection(format!("CLOSE failed: {}", e)))?;
        session
            .logout()
            .await
            .map_err(|e| ProviderError::Connection(format!("LOGOUT failed: {}", e)))?;

        tracing::info!("IMAP session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ImapConfig {
        ImapConfig {
            imap_host: "imap.example.com".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            ..ImapConfig::default()
        }
    }

    fn credentials() -> ImapCredentials {
        ImapCredentials {
            username: "relay@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    fn digest(recipients: &[&str]) -> OutgoingDigest {
        OutgoingDigest {
            subject: "cs arXiv, 03 Jan 2023".to_string(),
            html: "<html><body>Today's <b>cs</b> arXiv</body></html>".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn default_config_targets_gmail() {
        let config = ImapConfig::default();
        assert_eq!(config.imap_host, "imap.gmail.com");
        assert_eq!(config.imap_port, 993);
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.mailbox, "INBOX");
        assert_eq!(config.search_query(), "FROM \"no-reply@arxiv.org\"");
    }

    #[test]
    fn provider_creation() {
        let provider = ImapProvider::new(test_config(), credentials());
        assert!(!provider.is_authenticated());
        assert_eq!(provider.config().imap_host, "imap.example.com");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("relay@example.com"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn builds_html_message() {
        let message =
            ImapProvider::build_message("relay@example.com", &digest(&["a@example.com", "b@example.com"]))
                .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("From: relay@example.com"));
        assert!(formatted.contains("a@example.com"));
        assert!(formatted.contains("b@example.com"));
        assert!(formatted.contains("Subject: cs arXiv, 03 Jan 2023"));
        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("text/html"));
        assert!(!formatted.contains("text/plain"));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let result = ImapProvider::build_message("relay@example.com", &digest(&["not an address"]));
        assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_empty_recipient_list() {
        let result = ImapProvider::build_message("relay@example.com", &digest(&[]));
        assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn provider_requires_auth() {
        let provider = ImapProvider::new(test_config(), credentials());

        let result = provider.search_digests().await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));

        let result = provider.archive(MessageUid(1)).await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));

        let result = provider.send_digest(&digest(&["a@example.com"])).await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }

    #[tokio::test]
    async fn logout_without_session_is_noop() {
        let mut provider = ImapProvider::new(test_config(), credentials());
        assert!(provider.logout().await.is_ok());
    }

    #[test]
    fn body_is_taken_from_the_matching_uid() {
        let first: &[u8] = b"Subject: other";
        let second: &[u8] = b"Subject: wanted";
        let responses = [(Some(7), Some(first)), (Some(9), Some(second))];
        assert_eq!(body_for_uid(responses, MessageUid(9)), Some(second));
    }

    #[test]
    fn unrelated_fetch_responses_are_not_used() {
        let body: &[u8] = b"Subject: other";
        assert_eq!(body_for_uid([(Some(7), Some(body))], MessageUid(9)), None);
        assert_eq!(body_for_uid([(None, Some(body))], MessageUid(9)), None);
        assert_eq!(body_for_uid([(Some(9), None)], MessageUid(9)), None);
    }
}
