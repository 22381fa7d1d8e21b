//! Logical database configuration.
//!
//! Loads the set of named databases (primary, replicas, shards) from a YAML
//! file or from `DATABASE_URL*` environment variables.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::diesel_runtime::DatabaseConfig;
use crate::error::RepositoryError;

/// Logical database used when a repository does not name one.
pub const DEFAULT_DATABASE: &str = "primary";

/// Environment variable holding the default database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Top-level registry configuration
///
/// ```yaml
/// default: primary
/// databases:
///   primary:
///     url: postgres://localhost/app
///     max_connections: 20
///   replica:
///     url_env: REPLICA_DATABASE_URL
///     lazy: true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default = "default_database_name")]
    pub default: String,
    #[serde(default)]
    pub databases: IndexMap<String, DatabaseSettings>,
}

/// One logical database: where it lives and how its pool is tuned
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Name of an environment variable holding the URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_env: Option<String>,
    #[serde(flatten)]
    pub pool: DatabaseConfig,
}

fn default_database_name() -> String {
    DEFAULT_DATABASE.to_string()
}

impl DatabaseSettings {
    /// Settings for a literal URL with default pool tuning
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            url_env: None,
            pool: DatabaseConfig::default(),
        }
    }

    /// Resolve the connection URL, reading `url_env` from the process environment.
    pub fn resolve_url(&self) -> Result<String, RepositoryError> {
        self.resolve_url_with(|key| std::env::var(key).ok())
    }

    /// Resolve the connection URL with a custom variable lookup
    pub fn resolve_url_with<F>(&self, lookup: F) -> Result<String, RepositoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (&self.url, &self.url_env) {
            (Some(url), None) => Ok(url.clone()),
            (None, Some(key)) => lookup(key).ok_or_else(|| {
                RepositoryError::Config(format!("environment variable {} is not set", key))
            }),
            (Some(_), Some(_)) => Err(RepositoryError::Config(
                "set either 'url' or 'url_env', not both".to_string(),
            )),
            (None, None) => Err(RepositoryError::Config(
                "one of 'url' or 'url_env' is required".to_string(),
            )),
        }
    }
}

impl RegistryConfig {
    /// Load registry configuration from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file can't be read, has invalid format, or fails validation
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            RepositoryError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate registry configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RepositoryError> {
        let config: RegistryConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RepositoryError::Config(format!("failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    ///
    /// `DATABASE_URL` becomes `primary`; `DATABASE_URL_<NAME>` becomes `<name>`.
    /// Every such variable with a valid name is registered, so platform
    /// variables like `DATABASE_URL_UNPOOLED` show up as databases too. Use a
    /// YAML file to pick databases explicitly. Suffixes that are not valid
    /// database names are skipped with a warning.
    pub fn from_env() -> Result<Self, RepositoryError> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(key, value)` pairs shaped like environment variables
    pub fn from_vars<I>(vars: I) -> Result<Self, RepositoryError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}_", DATABASE_URL_VAR);
        let mut primary = None;
        // Sorted so the resulting order doesn't depend on the environment's
        let mut others = BTreeMap::new();

        for (key, value) in vars {
            if key == DATABASE_URL_VAR {
                primary = Some(value);
            } else if let Some(suffix) = key.strip_prefix(&prefix) {
                let name = suffix.to_lowercase();
                if validate_database_name(&name).is_err() {
                    tracing::warn!("Ignoring {}: '{}' is not a valid database name", key, name);
                    continue;
                }
                others.insert(name, value);
            }
        }

        let mut databases = IndexMap::new();
        if let Some(url) = primary {
            databases.insert(DEFAULT_DATABASE.to_string(), DatabaseSettings::from_url(url));
        }
        for (name, url) in others {
            if databases.contains_key(&name) {
                return Err(RepositoryError::DuplicateDatabase(name));
            }
            databases.insert(name, DatabaseSettings::from_url(url));
        }

        let config = RegistryConfig {
            default: default_database_name(),
            databases,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check names, URLs and that the default database is defined
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.databases.is_empty() {
            return Err(RepositoryError::Config("no databases configured".to_string()));
        }

        for (name, settings) in &self.databases {
            validate_database_name(name)?;
            if settings.url.is_some() == settings.url_env.is_some() {
                return Err(RepositoryError::Config(format!(
                    "database '{}' needs exactly one of 'url' or 'url_env'",
                    name
                )));
            }
        }

        if !self.databases.contains_key(&self.default) {
            return Err(RepositoryError::UnknownDatabase(self.default.clone()));
        }

        Ok(())
    }
}

/// Logical database names are lowercase identifiers: `primary`, `shard_replica_2`.
pub fn validate_database_name(name: &str) -> Result<(), RepositoryError> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let pattern = NAME.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(RepositoryError::InvalidDatabaseName(name.to_string()))
    }
}

/// Hide the password in a connection URL for display
pub fn mask_url(url: &str) -> String {
    static USERINFO: OnceLock<Regex> = OnceLock::new();
    let pattern = USERINFO
        .get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*://[^:/@]+):[^@/]*@").expect("valid regex"));

    pattern.replace(url, "${1}:***@").into_owned()
}
