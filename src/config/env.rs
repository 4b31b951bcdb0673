//! Typed coercion of environment variable values.
//!
//! Values are written the way they would be typed into a CI secret:
//! `True`, `[Ada Lovelace, Alan Turing]`, `"quoted text"`.

use std::collections::HashMap;
use std::path::Path;

use super::ConfigError;

/// A coerced environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// `True` or `False`.
    Flag(bool),
    /// Any other scalar, with one layer of matching quotes removed.
    Text(String),
    /// `[a, b, c]`, each element coerced on its own.
    List(Vec<EnvValue>),
}

impl EnvValue {
    /// Coerces a raw value. Empty values are treated as unset.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        if raw == "True" {
            return Some(Self::Flag(true));
        }
        if raw == "False" {
            return Some(Self::Flag(false));
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let items = inner.split(", ").filter_map(Self::parse).collect();
            return Some(Self::List(items));
        }
        if raw.len() >= 2 {
            for quote in ['"', '\''] {
                if let Some(inner) = raw.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
                    return Some(Self::Text(inner.to_string()));
                }
            }
        }
        Some(Self::Text(raw.to_string()))
    }

    /// Returns the value as a flag, if it is one.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the value as a list of strings.
    ///
    /// A scalar becomes a one-element list; nested lists are flattened.
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(items) => items.into_iter().flat_map(Self::into_list).collect(),
            scalar => vec![scalar.into_text()],
        }
    }

    /// Returns the value as text, rendering flags and lists as written.
    pub fn into_text(self) -> String {
        match self {
            Self::Flag(true) => "True".to_string(),
            Self::Flag(false) => "False".to_string(),
            Self::Text(text) => text,
            Self::List(items) => format!(
                "[{}]",
                items
                    .into_iter()
                    .map(Self::into_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Typed access to variables from a lookup function.
pub struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Wraps a lookup such as `|name| std::env::var(name).ok()`.
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Reads and coerces a variable; unset and empty are both `None`.
    pub fn value(&self, name: &str) -> Option<EnvValue> {
        (self.lookup)(name).and_then(|raw| EnvValue::parse(&raw))
    }

    /// Reads a string that must be present.
    pub fn required_text(&self, name: &str) -> Result<String, ConfigError> {
        self.value(name)
            .map(EnvValue::into_text)
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    /// Reads an optional string.
    pub fn text(&self, name: &str) -> Option<String> {
        self.value(name).map(EnvValue::into_text)
    }

    /// Reads a list that must be present.
    pub fn required_list(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        self.value(name)
            .map(EnvValue::into_list)
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    /// Reads an optional list.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.value(name).map(EnvValue::into_list)
    }

    /// Reads a flag, falling back to `default` when unset.
    pub fn flag(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.value(name) {
            None => Ok(default),
            Some(value) => value.as_flag().ok_or_else(|| ConfigError::Invalid {
                name: name.to_string(),
                reason: "expected True or False".to_string(),
            }),
        }
    }

    /// Reads a value parsed with [`str::parse`], falling back to `None` when unset.
    pub fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(name)
            .map(|text| {
                text.parse().map_err(|e: T::Err| ConfigError::Invalid {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

/// Reads a `.env` style file into a map without touching the process environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let entries = dotenvy::from_path_iter(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    entries
        .map(|entry| {
            entry.map_err(|e| ConfigError::EnvFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })
        .collect()
}
