//! External service providers.
//!
//! - [`email`] - Mailbox access (IMAP/SMTP)

pub mod email;
