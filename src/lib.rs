//! # Tablerepo: Per-Table CRUD Repositories over Diesel
//!
//! Tablerepo is a thin convenience layer on top of Diesel. It binds an entity
//! type to a table, routes every statement through a named logical database
//! (`primary`, `replica`, ...), and runs each call on its own pooled session.
//!
//! ## Features
//!
//! - **Table bindings**: generate per-table statements with [`table_binding!`]
//! - **CRUD surface**: get/insert/update/delete by id, bulk insert, delete-all
//! - **Composite keys**: tuple ids for multi-column primary keys
//! - **Named databases**: a registry of r2d2 pools built from YAML or `DATABASE_URL*`
//! - **Blob codec**: versioned JSON envelope for values kept outside columns
//!
//! ## Example
//!
//! ```ignore
//! use tablerepo::{DatabaseRegistry, RowLock, TableRepository};
//!
//! diesel::table! {
//!     widgets (id) {
//!         id -> Integer,
//!         name -> Text,
//!     }
//! }
//!
//! #[derive(Queryable, Selectable, Insertable, AsChangeset)]
//! #[diesel(table_name = widgets, treat_none_as_null = true)]
//! struct Widget {
//!     id: i32,
//!     name: String,
//! }
//!
//! tablerepo::table_binding! {
//!     struct WidgetTable {
//!         table: widgets,
//!         entity: Widget,
//!         id: i32,
//!         instance_id: |widget| Some(widget.id),
//!     }
//! }
//!
//! let registry = DatabaseRegistry::from_env()?;
//! let repo = TableRepository::<WidgetTable>::new(&registry)?;
//! repo.insert(&Widget { id: 1, name: "bolt".into() })?;
//! let widget = repo.get_or_raise_by_id(1, RowLock::None)?;
//! ```

pub mod codec;
pub mod config;
pub mod diesel_runtime;
pub mod error;

// Used by `table_binding!` expansions
#[doc(hidden)]
pub use diesel;

// Re-export key types
pub use config::{DatabaseSettings, RegistryConfig, DEFAULT_DATABASE};
pub use diesel_runtime::{
    Database, DatabaseConfig, DatabaseRegistry, DbConnection, RowLock, Session, TableBinding,
    TableRepository,
};
pub use error::{RepositoryError, Result};
