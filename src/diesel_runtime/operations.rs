//! Per-table statement building.
//!
//! [`TableBinding`] ties an entity type to a Diesel table and builds the
//! handful of statements a repository issues against it. Most bindings are
//! produced by [`table_binding!`](crate::table_binding); a hand-written impl
//! can replace the id predicate for tables the macro doesn't fit.

use diesel::QueryResult;
use std::fmt::Debug;

use crate::diesel_runtime::database::DbConnection;

/// Row lock requested by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLock {
    #[default]
    None,
    /// `SELECT ... FOR UPDATE`. Ignored on SQLite, which has no row locks.
    ForUpdate,
}

/// Binding between an entity type and the table that stores it.
///
/// Every statement runs on a connection the caller already checked out;
/// session handling belongs to [`TableRepository`](crate::TableRepository).
pub trait TableBinding {
    /// In-memory row type
    type Entity;

    /// Primary key value: a scalar, or a tuple for composite keys
    type Id: Clone + Debug;

    /// Table name, for logs and errors
    const TABLE: &'static str;

    /// Identifier of an entity, or `None` if it has not been assigned one
    fn instance_id(entity: &Self::Entity) -> Option<Self::Id>;

    fn select_by_id(
        conn: &mut DbConnection,
        id: Self::Id,
        lock: RowLock,
    ) -> QueryResult<Option<Self::Entity>>;

    fn select_all(conn: &mut DbConnection) -> QueryResult<Vec<Self::Entity>>;

    fn count(conn: &mut DbConnection) -> QueryResult<i64>;

    fn insert_one(conn: &mut DbConnection, entity: &Self::Entity) -> QueryResult<usize>;

    /// Multi-row insert in one statement
    fn insert_batch(conn: &mut DbConnection, entities: &[Self::Entity]) -> QueryResult<usize>;

    fn update_by_id(
        conn: &mut DbConnection,
        id: Self::Id,
        entity: &Self::Entity,
    ) -> QueryResult<usize>;

    fn delete_by_id(conn: &mut DbConnection, id: Self::Id) -> QueryResult<usize>;

    fn delete_all(conn: &mut DbConnection) -> QueryResult<usize>;
}

/// Generate a [`TableBinding`] for a Diesel `table!` module.
///
/// The entity must derive `Queryable`, `Selectable`, `Insertable` and
/// `AsChangeset` for the table. Composite primary keys work as long as
/// `id` is the matching tuple type.
///
/// `update` writes the entity's changeset as-is. Diesel's `AsChangeset`
/// derive skips `None` fields unless the entity is marked
/// `#[diesel(treat_none_as_null = true)]`; without it, clearing a nullable
/// column through `update` leaves the stored value in place.
///
/// # Example
/// ```ignore
/// use crate::schema::widgets;
///
/// #[derive(Queryable, Selectable, Insertable, AsChangeset)]
/// #[diesel(table_name = widgets, treat_none_as_null = true)]
/// pub struct Widget {
///     pub id: i32,
///     pub note: Option<String>,
/// }
///
/// tablerepo::table_binding! {
///     /// Widgets live in the primary database.
///     pub struct WidgetTable {
///         table: widgets,
///         entity: Widget,
///         id: i32,
///         instance_id: |widget| Some(widget.id),
///     }
/// }
///
/// let repo = TableRepository::<WidgetTable>::new(&registry)?;
/// ```
#[macro_export]
macro_rules! table_binding {
    (
        $(#[$meta:meta])*
        $vis:vis struct $binding:ident {
            table: $table:ident,
            entity: $entity:ty,
            id: $id:ty,
            instance_id: |$row:ident| $instance_id:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $binding;

        impl $crate::TableBinding for $binding {
            type Entity = $entity;
            type Id = $id;

            const TABLE: &'static str = stringify!($table);

            fn instance_id($row: &Self::Entity) -> Option<Self::Id> {
                $instance_id
            }

            fn select_by_id(
                conn: &mut $crate::DbConnection,
                id: Self::Id,
                lock: $crate::RowLock,
            ) -> $crate::diesel::QueryResult<Option<Self::Entity>> {
                use $crate::diesel::prelude::*;

                let query = $table::table.find(id).select(<$entity>::as_select());
                match lock {
                    $crate::RowLock::None => query.first::<$entity>(conn).optional(),
                    $crate::RowLock::ForUpdate => $crate::__lock_for_update!(query)
                        .first::<$entity>(conn)
                        .optional(),
                }
            }

            fn select_all(
                conn: &mut $crate::DbConnection,
            ) -> $crate::diesel::QueryResult<Vec<Self::Entity>> {
                use $crate::diesel::prelude::*;

                $table::table
                    .select(<$entity>::as_select())
                    .load::<$entity>(conn)
            }

            fn count(conn: &mut $crate::DbConnection) -> $crate::diesel::QueryResult<i64> {
                use $crate::diesel::prelude::*;

                $table::table.count().get_result::<i64>(conn)
            }

            fn insert_one(
                conn: &mut $crate::DbConnection,
                entity: &Self::Entity,
            ) -> $crate::diesel::QueryResult<usize> {
                use $crate::diesel::prelude::*;

                $crate::diesel::insert_into($table::table)
                    .values(entity)
                    .execute(conn)
            }

            fn insert_batch(
                conn: &mut $crate::DbConnection,
                entities: &[Self::Entity],
            ) -> $crate::diesel::QueryResult<usize> {
                use $crate::diesel::prelude::*;

                $crate::diesel::insert_into($table::table)
                    .values(entities)
                    .execute(conn)
            }

            fn update_by_id(
                conn: &mut $crate::DbConnection,
                id: Self::Id,
                entity: &Self::Entity,
            ) -> $crate::diesel::QueryResult<usize> {
                use $crate::diesel::prelude::*;

                $crate::diesel::update($table::table.find(id))
                    .set(entity)
                    .execute(conn)
            }

            fn delete_by_id(
                conn: &mut $crate::DbConnection,
                id: Self::Id,
            ) -> $crate::diesel::QueryResult<usize> {
                use $crate::diesel::prelude::*;

                $crate::diesel::delete($table::table.find(id)).execute(conn)
            }

            fn delete_all(conn: &mut $crate::DbConnection) -> $crate::diesel::QueryResult<usize> {
                use $crate::diesel::prelude::*;

                $crate::diesel::delete($table::table).execute(conn)
            }
        }
    };
}

#[doc(hidden)]
#[cfg(any(feature = "postgres", feature = "mysql"))]
#[macro_export]
macro_rules! __lock_for_update {
    ($query:expr) => {
        $query.for_update()
    };
}

// SQLite locks the whole database for writers; there is no row lock to take.
#[doc(hidden)]
#[cfg(not(any(feature = "postgres", feature = "mysql")))]
#[macro_export]
macro_rules! __lock_for_update {
    ($query:expr) => {
        $query
    };
}
