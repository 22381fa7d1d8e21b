//! Shared schema, entities and database helpers for integration tests.

#![allow(dead_code)]

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use std::path::Path;
use tablerepo::{Database, DatabaseConfig, DatabaseRegistry};
use tempfile::TempDir;

diesel::table! {
    widgets (id) {
        id -> Integer,
        name -> Text,
        quantity -> Integer,
        note -> Nullable<Text>,
    }
}

diesel::table! {
    memberships (team_id, user_id) {
        team_id -> Integer,
        user_id -> Integer,
        role -> Text,
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS widgets (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        note TEXT
    );
    CREATE TABLE IF NOT EXISTS memberships (
        team_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        role TEXT NOT NULL,
        PRIMARY KEY (team_id, user_id)
    );
"#;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = widgets, treat_none_as_null = true)]
pub struct Widget {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = memberships, primary_key(team_id, user_id))]
pub struct Membership {
    pub team_id: i32,
    pub user_id: i32,
    pub role: String,
}

tablerepo::table_binding! {
    pub struct WidgetTable {
        table: widgets,
        entity: Widget,
        id: i32,
        instance_id: |widget| Some(widget.id),
    }
}

tablerepo::table_binding! {
    /// Composite key: (team_id, user_id)
    pub struct MembershipTable {
        table: memberships,
        entity: Membership,
        id: (i32, i32),
        instance_id: |membership| Some((membership.team_id, membership.user_id)),
    }
}

pub fn widget(id: i32, name: &str, quantity: i32) -> Widget {
    Widget {
        id,
        name: name.to_string(),
        quantity,
        note: None,
    }
}

pub fn membership(team_id: i32, user_id: i32, role: &str) -> Membership {
    Membership {
        team_id,
        user_id,
        role: role.to_string(),
    }
}

pub fn small_pool() -> DatabaseConfig {
    DatabaseConfig {
        max_connections: 2,
        min_idle: 1,
        connection_timeout_secs: 5,
        ..DatabaseConfig::default()
    }
}

/// Open a SQLite file database named `name` under `dir` and create the schema
pub fn open_database(dir: &Path, name: &str, config: DatabaseConfig) -> Database {
    let path = dir.join(format!("{}.sqlite3", name));
    let database = Database::new_with_config(name, path.to_str().unwrap(), config)
        .expect("Failed to open test database");
    database
        .with_session(|conn| conn.batch_execute(SCHEMA))
        .expect("Failed to create schema");
    database
}

/// A pool whose every checkout fails quickly, for asserting no session is opened
pub fn unreachable_database(name: &str) -> Database {
    let config = DatabaseConfig {
        max_connections: 1,
        min_idle: 0,
        connection_timeout_secs: 1,
        lazy: true,
        ..DatabaseConfig::default()
    };
    Database::new_with_config(name, "/nonexistent/tablerepo/missing.sqlite3", config)
        .expect("Lazy pools build without connecting")
}

/// Registry with `primary` and `replica` SQLite databases in a temp directory
pub struct TestDatabases {
    pub registry: DatabaseRegistry,
    _dir: TempDir,
}

pub fn setup() -> TestDatabases {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut registry = DatabaseRegistry::new();
    registry
        .register(open_database(dir.path(), "primary", small_pool()))
        .unwrap();
    registry
        .register(open_database(dir.path(), "replica", small_pool()))
        .unwrap();

    TestDatabases {
        registry,
        _dir: dir,
    }
}
