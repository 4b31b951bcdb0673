//! Configuration and settings management.
//!
//! Settings are read once at startup from environment variables (optionally
//! seeded from a `.env` file) and passed by reference from then on.

mod env;
mod settings;

use std::path::PathBuf;

pub use env::{read_env_file, EnvReader, EnvValue};
pub use settings::{
    CategoryProfile, RelaySettings, ServerSettings, Settings, ENV_FILE_VAR, PHYSICS_CATEGORY,
};

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing environment variable {0}")]
    Missing(String),

    /// A variable holds a value of the wrong shape.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A `.env` file could not be read.
    #[error("cannot read env file {}: {reason}", path.display())]
    EnvFile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error message.
        reason: String,
    },
}
