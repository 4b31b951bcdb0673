//! Application settings and configuration types.
//!
//! Settings come from environment variables or a `.env` style file (see
//! [`Settings::load`]) and are loaded at startup. The digest core only ever
//! sees the per-category [`FilterConfig`] carried by a [`CategoryProfile`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::env::{read_env_file, EnvReader};
use super::ConfigError;
use crate::domain::FilterConfig;

/// Category label with its own recipient list and filters.
pub const PHYSICS_CATEGORY: &str = "physics";

/// Default IMAP server hostname.
pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
/// Default IMAP port (implicit TLS).
pub const DEFAULT_IMAP_PORT: u16 = 993;
/// Default SMTP server hostname.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// Sender address of arXiv digest mailings.
pub const DEFAULT_DIGEST_SENDER: &str = "no-reply@arxiv.org";
/// Variable naming a `.env` style file to load settings from.
pub const ENV_FILE_VAR: &str = "ARXIV_RELAY_ENV_FILE";

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Mailbox login, also used as the sender of relayed digests.
    pub username: String,
    /// Mailbox password or app password.
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Mail server endpoints.
    pub server: ServerSettings,
    /// Relay behavior.
    pub relay: RelaySettings,
    /// Profile for `cs` and any category other than physics.
    pub cs: CategoryProfile,
    /// Profile for the `physics` category.
    pub physics: CategoryProfile,
    /// Additional log file, if any.
    pub log_file: Option<PathBuf>,
}

/// Mail server endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// IMAP server hostname.
    pub imap_host: String,
    /// IMAP server port.
    pub imap_port: u16,
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port.
    pub smtp_port: u16,
    /// Address digests are searched for in the `FROM` header.
    pub digest_sender: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            imap_host: DEFAULT_IMAP_HOST.to_string(),
            imap_port: DEFAULT_IMAP_PORT,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            digest_sender: DEFAULT_DIGEST_SENDER.to_string(),
        }
    }
}

/// Relay behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Move processed and foreign messages to the trash.
    pub trash_fetched: bool,
    /// Send digests with a marked author to every recipient.
    pub advertise_marked: bool,
    /// Seconds between passes; `None` runs a single pass.
    pub poll_interval_secs: Option<u64>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            trash_fetched: false,
            advertise_marked: true,
            poll_interval_secs: None,
        }
    }
}

impl RelaySettings {
    /// Interval between passes, if polling is enabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }
}

/// Recipients and filters for one digest category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProfile {
    /// Addresses the reformatted digest is sent to.
    pub recipients: Vec<String>,
    /// Highlight and skip rules.
    pub filters: FilterConfig,
}

impl Settings {
    /// Loads settings at startup.
    ///
    /// Reads the file named by `ARXIV_RELAY_ENV_FILE` when that variable is set,
    /// and behaves as [`from_env`](Self::from_env) otherwise.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = std::env::var_os(ENV_FILE_VAR).map(PathBuf::from);
        Self::load_from(env_file.as_deref())
    }

    /// Loads settings from `env_file` when given, else from the environment.
    pub fn load_from(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => Self::from_env_file(path),
            None => Self::from_env(),
        }
    }

    /// Loads settings from the process environment.
    ///
    /// A `.env` file in the working directory is applied first when present;
    /// variables already set in the environment take precedence over it.
    ///
    /// # Required Environment Variables
    /// - `EMAIL_USERNAME`, `EMAIL_PASSWORD`: mailbox login
    /// - `EMAIL_RECIPIENTS_CS`: recipients of cs digests
    ///
    /// # Optional Environment Variables
    /// - `EMAIL_RECIPIENTS_PHYSICS` (default: cs recipients)
    /// - `MARK_CS`, `EMPH_CS`, `SKIP_CS` and their `_PHYSICS` counterparts,
    ///   which default to the cs values
    /// - `TRASH_FETCHED` (False), `ADVERTISE_MARKED` (True), `SEND_MARKED_ONLY` (False)
    /// - `IMAP_HOST`, `IMAP_PORT`, `SMTP_HOST`, `SMTP_PORT`, `DIGEST_SENDER`
    /// - `POLL_INTERVAL_SECS`, `LOG_FILE`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_reader(&EnvReader::new(|name: &str| std::env::var(name).ok()))
    }

    /// Loads settings from a `.env` style file, with the process environment
    /// taking precedence.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = read_env_file(path)?;
        Self::from_reader(&EnvReader::new(move |name: &str| {
            std::env::var(name).ok().or_else(|| vars.get(name).cloned())
        }))
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_reader<F>(env: &EnvReader<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = env.required_text("EMAIL_USERNAME")?;
        let password = env.required_text("EMAIL_PASSWORD")?;
        let marked_only = env.flag("SEND_MARKED_ONLY", false)?;

        let cs = CategoryProfile {
            recipients: non_empty(
                "EMAIL_RECIPIENTS_CS",
                env.required_list("EMAIL_RECIPIENTS_CS")?,
            )?,
            filters: FilterConfig {
                mark_authors: env.list("MARK_CS").unwrap_or_default(),
                mark_keywords: env.list("EMPH_CS").unwrap_or_default(),
                skip_words: env.list("SKIP_CS").unwrap_or_default(),
                marked_only,
            },
        };
        let physics = CategoryProfile {
            recipients: match env.list("EMAIL_RECIPIENTS_PHYSICS") {
                Some(list) => non_empty("EMAIL_RECIPIENTS_PHYSICS", list)?,
                None => cs.recipients.clone(),
            },
            filters: FilterConfig {
                mark_authors: env
                    .list("MARK_PHYSICS")
                    .unwrap_or_else(|| cs.filters.mark_authors.clone()),
                mark_keywords: env
                    .list("EMPH_PHYSICS")
                    .unwrap_or_else(|| cs.filters.mark_keywords.clone()),
                skip_words: env
                    .list("SKIP_PHYSICS")
                    .unwrap_or_else(|| cs.filters.skip_words.clone()),
                marked_only,
            },
        };

        let defaults = ServerSettings::default();
        let server = ServerSettings {
            imap_host: env.text("IMAP_HOST").unwrap_or(defaults.imap_host),
            imap_port: env.parsed("IMAP_PORT")?.unwrap_or(defaults.imap_port),
            smtp_host: env.text("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: env.parsed("SMTP_PORT")?.unwrap_or(defaults.smtp_port),
            digest_sender: env.text("DIGEST_SENDER").unwrap_or(defaults.digest_sender),
        };

        let relay = RelaySettings {
            trash_fetched: env.flag("TRASH_FETCHED", false)?,
            advertise_marked: env.flag("ADVERTISE_MARKED", true)?,
            poll_interval_secs: env.parsed("POLL_INTERVAL_SECS")?,
        };

        Ok(Self {
            username,
            password,
            server,
            relay,
            cs,
            physics,
            log_file: env.text("LOG_FILE").map(PathBuf::from),
        })
    }

    /// Returns the profile for a digest category.
    pub fn profile_for(&self, category: &str) -> &CategoryProfile {
        if category == PHYSICS_CATEGORY {
            &self.physics
        } else {
            &self.cs
        }
    }

    /// Every configured recipient once, in first-seen order.
    pub fn all_recipients(&self) -> Vec<String> {
        self.physics
            .recipients
            .iter()
            .chain(&self.cs.recipients)
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Recipients of a reformatted digest.
    ///
    /// Digests featuring a marked author go to everyone when
    /// `advertise_marked` is on; otherwise the category's own list is used.
    pub fn recipients_for(&self, category: &str, any_marked: bool) -> Vec<String> {
        if any_marked && self.relay.advertise_marked {
            self.all_recipients()
        } else {
            self.profile_for(category).recipients.clone()
        }
    }
}

/// Rejects a recipient list with no addresses.
fn non_empty(name: &str, recipients: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if recipients.is_empty() {
        return Err(ConfigError::Invalid {
            name: name.to_string(),
            reason: "must list at least one recipient".to_string(),
        });
    }
    Ok(recipients)
}
