// src/db/client.rs

//! The database client contract: the narrow surface a backend
//! must provide for introspection and migration application. Results are
//! opaque JSON; the caller (`db::introspect`, `manager::MigrationManager`)
//! is responsible for making sense of them.

use crate::error::Result;

/// One statement's worth of output, or a row, depending on which method
/// produced it. Backends that don't naturally speak JSON (a real SurrealDB
/// connection does) should shape their responses to match.
pub type Row = serde_json::Value;

/// A connection to a single database, scoped to one namespace/database pair.
///
/// Implementors own exactly one connection: `connect` must be
/// called before any other method, and `close` must run on every exit path,
/// including error paths, so callers are expected to pair it with a guard
/// or an explicit `close()` in both the success and failure branches.
pub trait DatabaseClient {
    /// Opens the connection. Bounded by an implementation-defined timeout;
    /// a real backend should surface `Error::Connection` on timeout or
    /// auth failure rather than blocking forever.
    fn connect(&mut self) -> Result<()>;

    /// Closes the connection. Idempotent: calling it twice, or calling it
    /// when `connect` never succeeded, must not panic.
    fn close(&mut self) -> Result<()>;

    /// Executes one or more `;`-separated statements as a single query and
    /// returns one result value per statement, in order. Used both for DDL
    /// (`DEFINE`/`REMOVE`/`ALTER`) and for introspection (`INFO FOR ...`).
    fn execute_query(&mut self, query: &str) -> Result<Vec<Row>>;

    /// Creates a record in `table` from `data` and returns the stored
    /// record (spec's ledger insert, `create _migrations`).
    fn create(&mut self, table: &str, data: serde_json::Value) -> Result<Row>;

    /// Selects all records at `target` (a table name or a specific record
    /// id), ordered however the backend naturally orders them.
    fn select(&mut self, target: &str) -> Result<Vec<Row>>;

    /// Deletes the record or table at `target`.
    fn delete(&mut self, target: &str) -> Result<()>;
}
