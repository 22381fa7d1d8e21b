//! Error types for repository operations.

use thiserror::Error;

/// Errors raised by repositories, sessions and the database registry.
///
/// Failures from the database itself are carried unmodified in
/// [`RepositoryError::Query`] and [`RepositoryError::Pool`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A required row was not found by id.
    #[error("no row in '{table}' with id {id}")]
    NotFound { table: &'static str, id: String },

    /// The entity carries no identifier, so it cannot be addressed by id.
    #[error("entity for '{table}' has no identifier")]
    MissingIdentifier { table: &'static str },

    #[error("unknown logical database '{0}'")]
    UnknownDatabase(String),

    #[error("invalid logical database name '{0}'")]
    InvalidDatabaseName(String),

    #[error("logical database '{0}' is already registered")]
    DuplicateDatabase(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Query(#[from] diesel::result::Error),
}

impl RepositoryError {
    /// True for the not-found domain error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;
