//! CRUD repository over one table.

use std::marker::PhantomData;

use crate::diesel_runtime::database::Database;
use crate::diesel_runtime::operations::{RowLock, TableBinding};
use crate::diesel_runtime::registry::DatabaseRegistry;
use crate::error::RepositoryError;

/// Row-level CRUD access to the table described by `B`.
///
/// A repository is bound to exactly one logical database, chosen when it is
/// built. Each call checks out one session, runs one statement, and returns
/// the session to the pool before returning.
///
/// # Example
/// ```ignore
/// let widgets = TableRepository::<WidgetTable>::new(&registry)?;
/// let reader = TableRepository::<WidgetTable>::on(&registry, "replica")?;
///
/// widgets.insert(&widget)?;
/// let found = reader.get_by_id(widget.id, RowLock::None)?;
/// ```
pub struct TableRepository<B: TableBinding> {
    database: Database,
    binding: PhantomData<fn() -> B>,
}

impl<B: TableBinding> Clone for TableRepository<B> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            binding: PhantomData,
        }
    }
}

impl<B: TableBinding> std::fmt::Debug for TableRepository<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRepository")
            .field("table", &B::TABLE)
            .field("database", &self.database.name())
            .finish()
    }
}

impl<B: TableBinding> TableRepository<B> {
    /// Repository on the registry's default logical database
    pub fn new(registry: &DatabaseRegistry) -> Result<Self, RepositoryError> {
        Self::on(registry, registry.default_name())
    }

    /// Repository on a named logical database
    pub fn on(registry: &DatabaseRegistry, database: &str) -> Result<Self, RepositoryError> {
        Ok(Self::with_database(registry.get(database)?.clone()))
    }

    pub fn with_database(database: Database) -> Self {
        Self {
            database,
            binding: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn table(&self) -> &'static str {
        B::TABLE
    }

    /// Fetch one row by id; `Ok(None)` if there is none.
    pub fn get_by_id(&self, id: B::Id, lock: RowLock) -> Result<Option<B::Entity>, RepositoryError> {
        tracing::debug!(
            "{}: get_by_id {:?} ({:?}) on '{}'",
            B::TABLE,
            id,
            lock,
            self.database.name()
        );
        self.database
            .with_session(|conn| B::select_by_id(conn, id, lock))
    }

    /// Fetch one row by id, failing with [`RepositoryError::NotFound`] if absent.
    pub fn get_or_raise_by_id(&self, id: B::Id, lock: RowLock) -> Result<B::Entity, RepositoryError> {
        match self.get_by_id(id.clone(), lock)? {
            Some(entity) => Ok(entity),
            None => Err(RepositoryError::NotFound {
                table: B::TABLE,
                id: format!("{:?}", id),
            }),
        }
    }

    pub fn get_all(&self) -> Result<Vec<B::Entity>, RepositoryError> {
        tracing::debug!("{}: get_all on '{}'", B::TABLE, self.database.name());
        self.database.with_session(B::select_all)
    }

    /// Number of rows in the table
    pub fn count(&self) -> Result<i64, RepositoryError> {
        tracing::debug!("{}: count on '{}'", B::TABLE, self.database.name());
        self.database.with_session(B::count)
    }

    /// Insert one row, returning the affected-row count.
    pub fn insert(&self, entity: &B::Entity) -> Result<usize, RepositoryError> {
        let inserted = self
            .database
            .with_session(|conn| B::insert_one(conn, entity))?;
        tracing::debug!(
            "{}: inserted {} row(s) on '{}'",
            B::TABLE,
            inserted,
            self.database.name()
        );
        Ok(inserted)
    }

    /// Insert all rows in a single statement.
    ///
    /// An empty slice returns `Ok(0)` without checking out a session.
    pub fn insert_many(&self, entities: &[B::Entity]) -> Result<usize, RepositoryError> {
        if entities.is_empty() {
            return Ok(0);
        }

        let inserted = self
            .database
            .with_session(|conn| B::insert_batch(conn, entities))?;
        tracing::debug!(
            "{}: batch inserted {} row(s) on '{}'",
            B::TABLE,
            inserted,
            self.database.name()
        );
        Ok(inserted)
    }

    /// Update the row addressed by the entity's identifier.
    ///
    /// Entities without an identifier are rejected before any session is opened.
    pub fn update(&self, entity: &B::Entity) -> Result<usize, RepositoryError> {
        let id = self.require_id(entity)?;
        tracing::debug!("{}: update {:?} on '{}'", B::TABLE, id, self.database.name());
        self.database
            .with_session(|conn| B::update_by_id(conn, id, entity))
    }

    /// Delete the row addressed by the entity's identifier.
    pub fn delete(&self, entity: &B::Entity) -> Result<usize, RepositoryError> {
        let id = self.require_id(entity)?;
        self.delete_by_id(id)
    }

    pub fn delete_by_id(&self, id: B::Id) -> Result<usize, RepositoryError> {
        tracing::debug!(
            "{}: delete_by_id {:?} on '{}'",
            B::TABLE,
            id,
            self.database.name()
        );
        self.database.with_session(|conn| B::delete_by_id(conn, id))
    }

    /// Delete every row, returning how many were removed.
    pub fn delete_all(&self) -> Result<usize, RepositoryError> {
        let deleted = self.database.with_session(B::delete_all)?;
        tracing::debug!(
            "{}: deleted all {} row(s) on '{}'",
            B::TABLE,
            deleted,
            self.database.name()
        );
        Ok(deleted)
    }

    fn require_id(&self, entity: &B::Entity) -> Result<B::Id, RepositoryError> {
        B::instance_id(entity).ok_or(RepositoryError::MissingIdentifier { table: B::TABLE })
    }
}
