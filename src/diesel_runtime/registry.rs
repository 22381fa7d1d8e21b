//! Named logical databases.
//!
//! A registry maps names such as `primary` or `replica` to connection pools.
//! Repositories pick their database from here once, when they are built.

use indexmap::IndexMap;

use crate::config::{validate_database_name, RegistryConfig, DEFAULT_DATABASE};
use crate::diesel_runtime::database::{Database, Session};
use crate::error::RepositoryError;

/// Registry of connection pools keyed by logical database name
#[derive(Debug, Clone)]
pub struct DatabaseRegistry {
    databases: IndexMap<String, Database>,
    default: String,
}

impl Default for DatabaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseRegistry {
    /// Empty registry whose default database is `primary`
    pub fn new() -> Self {
        Self {
            databases: IndexMap::new(),
            default: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Empty registry with a custom default database name
    pub fn with_default(name: &str) -> Result<Self, RepositoryError> {
        validate_database_name(name)?;
        Ok(Self {
            databases: IndexMap::new(),
            default: name.to_string(),
        })
    }

    /// Open a pool for every database in `config`.
    ///
    /// Non-lazy pools connect immediately, so an unreachable endpoint fails here.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RepositoryError> {
        config.validate()?;

        let mut registry = Self::with_default(&config.default)?;
        for (name, settings) in &config.databases {
            let url = settings.resolve_url()?;
            let database = Database::new_with_config(name, &url, settings.pool.clone())?;
            registry.register(database)?;
        }

        tracing::info!(
            "Database registry ready: [{}] (default '{}')",
            registry.names().collect::<Vec<_>>().join(", "),
            registry.default
        );
        Ok(registry)
    }

    /// Build a registry from `DATABASE_URL` and `DATABASE_URL_<NAME>` variables
    pub fn from_env() -> Result<Self, RepositoryError> {
        Self::from_config(&RegistryConfig::from_env()?)
    }

    /// Add a database under its own name
    pub fn register(&mut self, database: Database) -> Result<(), RepositoryError> {
        let name = database.name().to_string();
        validate_database_name(&name)?;
        if self.databases.contains_key(&name) {
            return Err(RepositoryError::DuplicateDatabase(name));
        }
        self.databases.insert(name, database);
        Ok(())
    }

    /// Look up a logical database by name
    pub fn get(&self, name: &str) -> Result<&Database, RepositoryError> {
        self.databases
            .get(name)
            .ok_or_else(|| RepositoryError::UnknownDatabase(name.to_string()))
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn default_database(&self) -> Result<&Database, RepositoryError> {
        self.get(&self.default)
    }

    /// Open a scoped session on the named database
    pub fn session(&self, name: &str) -> Result<Session<'_>, RepositoryError> {
        self.get(name)?.session()
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}
