//! Store connection configuration.
//!
//! # Responsibility
//! - Describe where a collection lives: store URI, database and collection.
//! - Resolve configuration once, at startup, from the process environment.
//!
//! # Invariants
//! - A constructed `StoreConfig` always carries valid names.
//! - Core operations never read environment variables themselves.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const URI_ENV: &str = "PAPERSTORE_URI";
pub const DATABASE_ENV: &str = "PAPERSTORE_DATABASE";
pub const COLLECTION_ENV: &str = "PAPERSTORE_COLLECTION";

/// URI selecting a private in-memory database per acquisition.
pub const MEMORY_URI: &str = ":memory:";

const DATABASE_FILE_EXTENSION: &str = "sqlite3";

static DATABASE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("database name pattern is valid"));
static COLLECTION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]{0,119}$").expect("collection name pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing configuration value `{key}`"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid value `{value}` for `{key}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where the target collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    uri: String,
    database: String,
    collection: String,
}

impl StoreConfig {
    /// Creates a validated configuration.
    ///
    /// `uri` is a directory holding database files, or `:memory:`.
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let uri = uri.into();
        let database = database.into();
        let collection = collection.into();

        if uri.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: URI_ENV,
                value: uri,
                reason: "uri cannot be empty",
            });
        }
        if !DATABASE_NAME_RE.is_match(&database) {
            return Err(ConfigError::Invalid {
                key: DATABASE_ENV,
                value: database,
                reason: "expected 1-64 characters from [A-Za-z0-9_-]",
            });
        }
        validate_collection_name(&collection)?;

        Ok(Self {
            uri,
            database,
            collection,
        })
    }

    /// Reads `PAPERSTORE_URI`, `PAPERSTORE_DATABASE` and
    /// `PAPERSTORE_COLLECTION` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        Self::new(
            require(URI_ENV)?,
            require(DATABASE_ENV)?,
            require(COLLECTION_ENV)?,
        )
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn is_in_memory(&self) -> bool {
        self.uri == MEMORY_URI
    }

    /// Database file path, or `None` for in-memory stores.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        Some(
            PathBuf::from(&self.uri)
                .join(format!("{}.{DATABASE_FILE_EXTENSION}", self.database)),
        )
    }
}

/// Checks a collection name against the accepted pattern.
pub fn validate_collection_name(name: &str) -> Result<(), ConfigError> {
    if COLLECTION_NAME_RE.is_match(name) {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        key: COLLECTION_ENV,
        value: name.to_string(),
        reason: "expected a letter or `_` followed by up to 119 characters from [A-Za-z0-9_.-]",
    })
}
