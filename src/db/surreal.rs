// src/db/surreal.rs

//! A real [`DatabaseClient`] over the `surrealdb` crate, gated behind the
//! `surreal-client` feature so the core pipeline builds and tests without
//! a live database or the async stack it needs.
//!
//! `surrealdb`'s API is async; the rest of smig is synchronous, wrapped
//! the same way a blocking HTTP client wraps an async one underneath.
//! Here the wrapping is explicit: one Tokio runtime is built per client
//! and every call is driven to completion with `block_on`, so callers
//! never see a `Future`.

use serde_json::Value;
use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tokio::runtime::Runtime;

use crate::db::client::{DatabaseClient, Row};
use crate::db::split_statements;
use crate::error::{Error, Result};

/// Connection parameters for a live SurrealDB endpoint, narrowed from the
/// resolved [`crate::config::Config`] to what the wire client needs.
pub struct SurrealConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// A real database connection. `db` is `None` until [`connect`] succeeds;
/// every other method requires it.
///
/// [`connect`]: DatabaseClient::connect
pub struct SurrealClient {
    config: SurrealConfig,
    runtime: Runtime,
    db: Option<Surreal<Any>>,
}

impl SurrealClient {
    pub fn new(config: SurrealConfig) -> Result<Self> {
        let runtime = Runtime::new().map_err(Error::Io)?;
        Ok(SurrealClient { config, runtime, db: None })
    }

    fn require_connected(&self) -> Result<&Surreal<Any>> {
        self.db.as_ref().ok_or_else(|| Error::Connection {
            url: self.config.url.clone(),
            message: "not connected".to_string(),
        })
    }

    fn connection_error(&self, err: impl std::fmt::Display) -> Error {
        Error::Connection { url: self.config.url.clone(), message: err.to_string() }
    }
}

impl DatabaseClient for SurrealClient {
    fn connect(&mut self) -> Result<()> {
        let config = &self.config;
        let db = self.runtime.block_on(async {
            let db = connect(config.url.as_str()).await?;
            db.signin(Root { username: &config.username, password: &config.password }).await?;
            db.use_ns(config.namespace.as_str()).use_db(config.database.as_str()).await?;
            Ok::<_, surrealdb::Error>(db)
        });
        match db {
            Ok(db) => {
                self.db = Some(db);
                Ok(())
            }
            Err(e) => Err(self.connection_error(e)),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.db = None;
        Ok(())
    }

    fn execute_query(&mut self, query: &str) -> Result<Vec<Row>> {
        let statement_count = split_statements(query).len().max(1);
        let db = self.require_connected()?;
        let query_owned = query.to_string();

        let result = self.runtime.block_on(async {
            let mut response = db.query(&query_owned).await?;
            let mut rows = Vec::with_capacity(statement_count);
            for i in 0..statement_count {
                let value: Value = response.take(i)?;
                rows.push(value);
            }
            Ok::<_, surrealdb::Error>(rows)
        });

        result.map_err(|e| Error::Apply { statement_number: 0, first_line: e.to_string() })
    }

    fn create(&mut self, table: &str, data: Value) -> Result<Row> {
        let db = self.require_connected()?;
        let table = table.to_string();

        let result: std::result::Result<Option<Value>, surrealdb::Error> =
            self.runtime.block_on(async { db.create(table.as_str()).content(data).await });

        result.map_err(|e| self.connection_error(e))?.ok_or_else(|| Error::Connection {
            url: self.config.url.clone(),
            message: format!("create on {table} returned no record"),
        })
    }

    fn select(&mut self, target: &str) -> Result<Vec<Row>> {
        let db = self.require_connected()?;
        let target = target.to_string();

        let result: std::result::Result<Vec<Value>, surrealdb::Error> =
            self.runtime.block_on(async { db.select(target.as_str()).await });

        result.map_err(|e| self.connection_error(e))
    }

    fn delete(&mut self, target: &str) -> Result<()> {
        let db = self.require_connected()?;
        let target = target.to_string();

        let result: std::result::Result<Option<Value>, surrealdb::Error> =
            self.runtime.block_on(async { db.delete(target.as_str()).await });

        result.map_err(|e| self.connection_error(e))?;
        Ok(())
    }
}
