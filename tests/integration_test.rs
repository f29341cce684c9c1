// tests/integration_test.rs

//! End-to-end tests for smig's full pipeline, run against the in-memory
//! `MockClient` so they exercise introspect → parse → normalize → diff →
//! emit → apply → ledger without a live database.

use smig::db::client::DatabaseClient;
use smig::db::mock::MockClient;
use smig::ir::Schema;
use smig::manager::{MigrateOutcome, MigrationManager};
use smig::schema_file;

fn user_schema(email_type: &str) -> Schema {
    Schema::builder()
        .table("user", |t| {
            t.field("email", |f| f.type_of(email_type).assert("$value != NONE"))
                .index("email_ix", |i| i.columns(["email"]).unique())
        })
        .build()
        .unwrap()
}

#[test]
fn full_migration_lifecycle_applies_then_settles() {
    let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
    manager.connect().unwrap();
    manager.initialize().unwrap();

    assert!(manager.has_changes().unwrap(), "a fresh database should need the initial migration");

    let applied = match manager.migrate(Some("create user".to_string())).unwrap() {
        MigrateOutcome::Applied(migration) => migration,
        MigrateOutcome::NoChanges => panic!("expected the first migrate to apply something"),
    };
    assert!(applied.id.is_some());
    assert!(applied.up.contains("DEFINE TABLE user"));
    assert!(applied.down.contains("REMOVE TABLE user"));

    assert!(!manager.has_changes().unwrap(), "re-diffing against what was just applied should be empty");
    assert!(matches!(manager.migrate(None).unwrap(), MigrateOutcome::NoChanges));

    let status = manager.status().unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].message.as_deref(), Some("create user"));

    manager.close().unwrap();
}

#[test]
fn widening_a_field_produces_a_second_migration() {
    let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
    manager.connect().unwrap();
    manager.initialize().unwrap();
    manager.migrate(None).unwrap();

    let mut manager = MigrationManager::new(user_schema("int"), manager.into_client());
    assert!(manager.has_changes().unwrap());
    let applied = match manager.migrate(Some("widen email".to_string())).unwrap() {
        MigrateOutcome::Applied(m) => m,
        MigrateOutcome::NoChanges => panic!("expected a change after widening the field type"),
    };
    assert!(applied.up.contains("TYPE int"));

    assert_eq!(manager.status().unwrap().len(), 2);
}

#[test]
fn rollback_all_after_restores_the_database_to_its_first_migration() {
    let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
    manager.connect().unwrap();
    manager.initialize().unwrap();
    let first = match manager.migrate(Some("create user".to_string())).unwrap() {
        MigrateOutcome::Applied(m) => m,
        _ => unreachable!(),
    };

    let mut manager = MigrationManager::new(user_schema("int"), manager.into_client());
    manager.migrate(Some("widen email".to_string())).unwrap();

    let rolled_back = manager.rollback_all_after(first.id.as_ref().unwrap()).unwrap();
    assert_eq!(rolled_back.len(), 2);
    assert!(manager.status().unwrap().is_empty());
    assert!(manager.has_changes().unwrap());
}

#[test]
fn a_schema_loaded_from_a_toml_file_round_trips_through_the_same_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.toml");
    std::fs::write(&path, schema_file::render_starter_toml()).unwrap();

    let desired = schema_file::load_schema_from_file(&path).unwrap();
    let mut manager = MigrationManager::new(desired, Box::new(MockClient::new()));
    manager.connect().unwrap();
    manager.initialize().unwrap();

    let applied = match manager.migrate(None).unwrap() {
        MigrateOutcome::Applied(m) => m,
        MigrateOutcome::NoChanges => panic!("starter schema should produce a migration against an empty database"),
    };
    assert!(applied.up.contains("DEFINE TABLE user"));
}

#[test]
fn tampering_with_a_ledger_row_is_caught_on_rollback() {
    use smig::ledger::MIGRATIONS_TABLE;
    use serde_json::Value;

    let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
    manager.connect().unwrap();
    manager.initialize().unwrap();
    let applied = match manager.migrate(None).unwrap() {
        MigrateOutcome::Applied(m) => m,
        _ => unreachable!(),
    };
    let id = applied.id.clone().unwrap();

    let rows = manager.client_mut().select(MIGRATIONS_TABLE).unwrap();
    let mut row = rows.into_iter().find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())).unwrap();
    row["up"] = Value::String("DEFINE TABLE tampered;".to_string());
    manager.client_mut().delete(&id).unwrap();
    manager.client_mut().create(MIGRATIONS_TABLE, row).unwrap();

    let err = manager.rollback(Some(&id)).unwrap_err();
    assert!(matches!(err, smig::Error::Tampered { .. }));
}
