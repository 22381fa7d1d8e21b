//! Diesel ORM runtime infrastructure
//!
//! This module provides named connection pools, scoped sessions and the
//! per-table CRUD repository built on top of them.
//!
//! # Features
//!
//! - `sqlite` (default): bundled SQLite backend
//! - `postgres`: PostgreSQL backend, with `SELECT ... FOR UPDATE` row locks
//! - `mysql`: MySQL backend, with `SELECT ... FOR UPDATE` row locks

pub mod database;
pub mod operations;
pub mod registry;
pub mod repository;

// Re-export key types
pub use database::{Database, DatabaseConfig, DbConnection, Pool, PooledConnection, Session};
pub use operations::{RowLock, TableBinding};
pub use registry::DatabaseRegistry;
pub use repository::TableRepository;
