// src/manager.rs

//! Ties the pipeline together: introspect the live schema,
//! normalize both sides, diff, emit, and apply — recording every applied
//! migration in the ledger so it can be rolled back later.

use serde_json::Value;

use crate::db::client::DatabaseClient;
use crate::db::introspect;
use crate::diff;
use crate::emit;
use crate::error::{Error, Result};
use crate::ir::Schema;
use crate::ledger::{self, Migration, MIGRATIONS_TABLE};
use crate::normalize::normalize_schema;
use crate::parse::parse_schema;

/// The result of [`MigrationManager::migrate`]: either nothing changed
/// (a well-known success), or a migration was built and applied.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrateOutcome {
    NoChanges,
    Applied(Migration),
}

/// Owns the single connection to one database and the desired
/// schema it is being migrated towards.
pub struct MigrationManager {
    desired: Schema,
    client: Box<dyn DatabaseClient>,
}

impl MigrationManager {
    pub fn new(desired: Schema, client: Box<dyn DatabaseClient>) -> Self {
        MigrationManager { desired, client }
    }

    pub fn connect(&mut self) -> Result<()> {
        self.client.connect()
    }

    pub fn close(&mut self) -> Result<()> {
        self.client.close()
    }

    /// Reclaims the underlying connection, e.g. to hand it to a new
    /// manager pointed at a different desired schema against the same
    /// database.
    pub fn into_client(self) -> Box<dyn DatabaseClient> {
        self.client
    }

    /// Direct access to the underlying connection, for callers that need
    /// to issue queries the manager itself has no method for.
    pub fn client_mut(&mut self) -> &mut dyn DatabaseClient {
        self.client.as_mut()
    }

    /// Defines the ledger's own table. Safe to call on every run
    /// (DESIGN.md open question 9).
    pub fn initialize(&mut self) -> Result<()> {
        self.client.execute_query(ledger::LEDGER_SCHEMA_DDL)?;
        Ok(())
    }

    fn live_schema(&mut self) -> Result<Schema> {
        let info = introspect(self.client.as_mut())?;
        Ok(normalize_schema(&parse_schema(&info)))
    }

    fn desired_schema(&self) -> Schema {
        normalize_schema(&self.desired)
    }

    fn pending_changes(&mut self) -> Result<diff::ChangeSet> {
        let live = self.live_schema()?;
        let desired = self.desired_schema();
        Ok(diff::diff(&desired, &live))
    }

    /// Whether applying `migrate` right now would produce any statements.
    pub fn has_changes(&mut self) -> Result<bool> {
        Ok(!self.pending_changes()?.is_empty())
    }

    /// Diffs the live schema against the desired one and renders the
    /// result, without applying or recording anything (`smig generate`).
    pub fn generate(&mut self) -> Result<(String, String)> {
        let changes = self.pending_changes()?;
        Ok(emit::emit(&changes))
    }

    /// Computes, applies and records one migration. Returns
    /// [`MigrateOutcome::NoChanges`] without touching the ledger or the
    /// database when the live schema already matches the desired one.
    pub fn migrate(&mut self, message: Option<String>) -> Result<MigrateOutcome> {
        let changes = self.pending_changes()?;
        if changes.is_empty() {
            return Ok(MigrateOutcome::NoChanges);
        }

        let (up, down) = emit::emit(&changes);
        let mut migration = Migration::new(up, down, message);

        self.client.execute_query(&migration.up)?;

        let row = self.client.create(MIGRATIONS_TABLE, serde_json::to_value(&migration).map_err(to_schema_file_err)?)?;
        migration.id = row.get("id").and_then(Value::as_str).map(String::from);

        Ok(MigrateOutcome::Applied(migration))
    }

    /// The ledger's contents, oldest first.
    pub fn status(&mut self) -> Result<Vec<Migration>> {
        let rows = self.client.select(MIGRATIONS_TABLE)?;
        let mut migrations = deserialize_rows(rows)?;
        migrations.sort_by_key(|m| m.applied_at);
        Ok(migrations)
    }

    /// Rolls back one migration: the one named by `id`, or the most
    /// recently applied one when `id` is `None`.
    pub fn rollback(&mut self, id: Option<&str>) -> Result<Migration> {
        let mut migrations = self.status()?;
        let migration = match id {
            Some(id) => {
                let pos = migrations.iter().position(|m| m.id.as_deref() == Some(id));
                match pos {
                    Some(pos) => migrations.remove(pos),
                    None => return Err(Error::UnknownMigration(id.to_string())),
                }
            }
            None => match migrations.pop() {
                Some(m) => m,
                None => return Err(Error::UnknownMigration("(none applied)".to_string())),
            },
        };
        self.rollback_one(migration)
    }

    /// Rolls back every migration applied at or after `id`'s own
    /// `appliedAt`, most-recent first, aborting on the first failure
    /// (the remaining rows are left applied).
    pub fn rollback_all_after(&mut self, id: &str) -> Result<Vec<Migration>> {
        let migrations = self.status()?;
        let anchor = migrations
            .iter()
            .find(|m| m.id.as_deref() == Some(id))
            .ok_or_else(|| Error::UnknownMigration(id.to_string()))?;
        let anchor_time = anchor.applied_at;

        let mut to_roll_back: Vec<Migration> =
            migrations.into_iter().filter(|m| m.applied_at >= anchor_time).collect();
        to_roll_back.sort_by_key(|m| std::cmp::Reverse(m.applied_at));

        let mut rolled_back = Vec::new();
        for migration in to_roll_back {
            rolled_back.push(self.rollback_one(migration)?);
        }
        Ok(rolled_back)
    }

    fn rollback_one(&mut self, migration: Migration) -> Result<Migration> {
        if !migration.is_intact() {
            let id = migration.id.clone().unwrap_or_default();
            return Err(Error::Tampered { id });
        }
        self.client.execute_query(&migration.down)?;
        if let Some(id) = &migration.id {
            self.client.delete(id)?;
        }
        Ok(migration)
    }
}

fn deserialize_rows(rows: Vec<Value>) -> Result<Vec<Migration>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(to_schema_file_err))
        .collect()
}

fn to_schema_file_err(e: serde_json::Error) -> Error {
    Error::SchemaFile(format!("malformed ledger row: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockClient;

    fn user_schema(email_type: &str) -> Schema {
        Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of(email_type)))
            .build()
            .unwrap()
    }

    #[test]
    fn migrate_applies_then_reports_no_changes() {
        let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
        manager.connect().unwrap();
        manager.initialize().unwrap();

        let outcome = manager.migrate(Some("initial".to_string())).unwrap();
        let applied = match outcome {
            MigrateOutcome::Applied(m) => m,
            MigrateOutcome::NoChanges => panic!("expected a migration"),
        };
        assert!(applied.id.is_some());
        assert!(applied.up.contains("DEFINE TABLE user"));

        assert!(matches!(manager.migrate(None).unwrap(), MigrateOutcome::NoChanges));
        assert!(!manager.has_changes().unwrap());
    }

    #[test]
    fn rollback_reverts_the_latest_migration() {
        let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
        manager.connect().unwrap();
        manager.initialize().unwrap();
        manager.migrate(None).unwrap();

        assert_eq!(manager.status().unwrap().len(), 1);
        manager.rollback(None).unwrap();
        assert!(manager.status().unwrap().is_empty());
        assert!(manager.has_changes().unwrap());
    }

    #[test]
    fn rollback_detects_tampering() {
        let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
        manager.connect().unwrap();
        manager.initialize().unwrap();
        let applied = match manager.migrate(None).unwrap() {
            MigrateOutcome::Applied(m) => m,
            _ => unreachable!(),
        };

        // Tamper with the stored row directly through the ledger table.
        let id = applied.id.clone().unwrap();
        let rows = manager.client.select(MIGRATIONS_TABLE).unwrap();
        let mut row = rows.into_iter().find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())).unwrap();
        row["up"] = Value::String("DEFINE TABLE tampered;".to_string());
        manager.client.delete(&id).unwrap();
        manager.client.create(MIGRATIONS_TABLE, row).unwrap();

        let err = manager.rollback(Some(&id)).unwrap_err();
        assert!(matches!(err, Error::Tampered { .. }));
    }

    #[test]
    fn rollback_all_after_reverts_every_later_migration() {
        let mut manager = MigrationManager::new(user_schema("string"), Box::new(MockClient::new()));
        manager.connect().unwrap();
        manager.initialize().unwrap();
        let first = match manager.migrate(Some("add user".to_string())).unwrap() {
            MigrateOutcome::Applied(m) => m,
            _ => unreachable!(),
        };

        manager.desired = user_schema("int");
        manager.migrate(Some("widen email".to_string())).unwrap();
        assert_eq!(manager.status().unwrap().len(), 2);

        let rolled_back = manager.rollback_all_after(first.id.as_ref().unwrap()).unwrap();
        assert_eq!(rolled_back.len(), 2);
        assert!(manager.status().unwrap().is_empty());
    }
}
