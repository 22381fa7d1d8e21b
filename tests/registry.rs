//! Integration tests for the logical database registry and scoped sessions.

#![cfg(all(feature = "sqlite", not(any(feature = "postgres", feature = "mysql"))))]

mod common;

use common::{open_database, small_pool, unreachable_database, widget, WidgetTable};
use diesel::prelude::*;
use tablerepo::{
    DatabaseConfig, DatabaseRegistry, RegistryConfig, RepositoryError, RowLock, TableRepository,
};

#[test]
fn test_registry_from_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("primary.sqlite3");
    let replica = dir.path().join("replica.sqlite3");

    let yaml = format!(
        "default: primary\n\
         databases:\n  \
           primary:\n    url: {}\n    max_connections: 2\n    min_idle: 1\n  \
           replica:\n    url: {}\n    lazy: true\n",
        primary.display(),
        replica.display()
    );
    let config_path = dir.path().join("databases.yaml");
    std::fs::write(&config_path, yaml).unwrap();

    let config = RegistryConfig::from_file(&config_path).unwrap();
    let registry = DatabaseRegistry::from_config(&config).unwrap();

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["primary", "replica"]);
    assert_eq!(registry.default_name(), "primary");
    assert_eq!(registry.default_database().unwrap().name(), "primary");
    assert_eq!(registry.len(), 2);

    registry.get("primary").unwrap().ping().unwrap();
    registry.get("replica").unwrap().ping().unwrap();
}

#[test]
fn test_registry_from_config_with_unset_url_env() {
    let config = RegistryConfig::from_yaml_str(
        "databases:\n  primary:\n    url_env: TABLEREPO_TEST_SURELY_UNSET_URL\n",
    )
    .unwrap();

    let err = DatabaseRegistry::from_config(&config).unwrap_err();
    assert!(matches!(err, RepositoryError::Config(_)));
}

#[test]
fn test_register_rejects_duplicates_and_bad_names() {
    let mut registry = DatabaseRegistry::new();
    registry.register(unreachable_database("primary")).unwrap();

    let err = registry.register(unreachable_database("primary")).unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateDatabase(name) if name == "primary"));

    let err = registry.register(unreachable_database("Read-Replica")).unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidDatabaseName(_)));

    assert!(DatabaseRegistry::with_default("main db").is_err());
}

#[test]
fn test_custom_default_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = DatabaseRegistry::with_default("main").unwrap();
    registry
        .register(open_database(dir.path(), "main", small_pool()))
        .unwrap();

    let repo = TableRepository::<WidgetTable>::new(&registry).unwrap();
    assert_eq!(repo.database().name(), "main");
    repo.insert(&widget(1, "bolt", 12)).unwrap();
    assert!(repo.get_by_id(1, RowLock::None).unwrap().is_some());
}

#[test]
fn test_missing_default_database() {
    let registry = DatabaseRegistry::new();

    assert!(registry.is_empty());
    let err = TableRepository::<WidgetTable>::new(&registry).unwrap_err();
    assert!(matches!(err, RepositoryError::UnknownDatabase(name) if name == "primary"));
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

fn single_connection() -> DatabaseConfig {
    DatabaseConfig {
        max_connections: 1,
        min_idle: 1,
        connection_timeout_secs: 1,
        ..DatabaseConfig::default()
    }
}

#[test]
fn test_session_holds_the_connection_until_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let database = open_database(dir.path(), "primary", single_connection());

    let session = database.session().unwrap();
    assert_eq!(session.database(), "primary");
    assert!(matches!(database.session(), Err(RepositoryError::Pool(_))));

    drop(session);
    assert!(database.session().is_ok());
}

#[test]
fn test_session_released_after_failed_statement() {
    let dir = tempfile::tempdir().unwrap();
    let database = open_database(dir.path(), "primary", single_connection());

    let err = database
        .with_session(|conn| diesel::sql_query("SELECT * FROM no_such_table").execute(conn))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Query(_)));

    // The only connection went back to the pool
    database.ping().unwrap();

    let repo = TableRepository::<WidgetTable>::with_database(database);
    assert!(repo.get_by_id(1, RowLock::None).is_ok());
}

#[test]
fn test_registry_session_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = DatabaseRegistry::new();
    registry
        .register(open_database(dir.path(), "primary", small_pool()))
        .unwrap();

    let session = registry.session("primary").unwrap();
    assert_eq!(session.database(), "primary");
    drop(session);

    assert!(matches!(
        registry.session("replica"),
        Err(RepositoryError::UnknownDatabase(_))
    ));
}
