// src/db/mock.rs

//! In-memory [`DatabaseClient`] backed by a [`Schema`], used by the test
//! command and the crate's own integration tests. Emitted DDL is
//! interpreted by feeding each statement to the same single-statement
//! parsers the introspection pass (`parse::*`) uses, so the mock's notion
//! of "what the live schema looks like" never drifts from what the real
//! parser would reconstruct. `INFO FOR ...` queries are answered by
//! re-rendering the stored schema with `emit`'s own DDL builders.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::db::client::{DatabaseClient, Row};
use crate::db::split_statements;
use crate::emit;
use crate::error::{Error, Result};
use crate::ir::{Schema, Table};
use crate::parse::{access_method, analyzer, event, field, function, index, param, sequence, table};

static ON_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon\s+table\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static INFO_FOR_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^info\s+for\s+table\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static REMOVE_STMT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^remove\s+(table|field|index|event|function|analyzer|access|param|sequence)\s+\$?([A-Za-z_][A-Za-z0-9_:]*)").unwrap()
});
static ALTER_STMT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^alter\s+(table|field|index|analyzer)\s+\$?([A-Za-z_][A-Za-z0-9_:]*).*?\brename\s+\$?([A-Za-z_][A-Za-z0-9_:]*)\s*;?\s*$").unwrap()
});

fn on_table(stmt: &str) -> Option<String> {
    ON_TABLE.captures(stmt).map(|c| c[1].to_string())
}

fn first_line(stmt: &str) -> String {
    stmt.lines().next().unwrap_or("").trim().to_string()
}

fn apply_err(stmt: &str) -> Error {
    Error::Apply { statement_number: 0, first_line: first_line(stmt) }
}

fn reindex(err: Error, statement_number: usize) -> Error {
    match err {
        Error::Apply { first_line, .. } => Error::Apply { statement_number, first_line },
        other => other,
    }
}

/// A throwaway, process-local stand-in for a real database connection.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    connected: bool,
    schema: Schema,
    ledger: Vec<Value>,
}

impl MockClient {
    pub fn new() -> Self {
        MockClient::default()
    }

    /// Seeds the mock with an already-built schema, as if it had been
    /// applied by some earlier migration.
    pub fn seeded(schema: Schema) -> Self {
        MockClient { connected: false, schema, ledger: Vec::new() }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn require_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::Connection { url: "mock://".to_string(), message: "not connected".to_string() })
        }
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        if self.schema.tables.contains_key(name) {
            self.schema.tables.get_mut(name)
        } else {
            self.schema.relations.get_mut(name)
        }
    }

    fn info_for_db(&self) -> Value {
        let mut tables = serde_json::Map::new();
        for (name, t) in self.schema.tables.iter().chain(self.schema.relations.iter()) {
            tables.insert(name.clone(), json!(emit::define_table(t, false)));
        }
        let mut functions = serde_json::Map::new();
        for (name, f) in &self.schema.functions {
            functions.insert(name.clone(), json!(emit::define_function(f, false)));
        }
        let mut analyzers = serde_json::Map::new();
        for (name, a) in &self.schema.analyzers {
            analyzers.insert(name.clone(), json!(emit::define_analyzer(a, false)));
        }
        let mut accesses = serde_json::Map::new();
        for (name, a) in &self.schema.access_methods {
            accesses.insert(name.clone(), json!(emit::define_access(a, false)));
        }
        let mut params = serde_json::Map::new();
        for (name, p) in &self.schema.params {
            params.insert(name.clone(), json!(emit::define_param(p, false)));
        }
        let mut sequences = serde_json::Map::new();
        for (name, s) in &self.schema.sequences {
            sequences.insert(name.clone(), json!(emit::define_sequence(s, false)));
        }
        json!({
            "tables": tables,
            "functions": functions,
            "analyzers": analyzers,
            "accesses": accesses,
            "params": params,
            "sequences": sequences,
        })
    }

    fn info_for_table(&self, name: &str) -> Option<Value> {
        let table = self.schema.tables.get(name).or_else(|| self.schema.relations.get(name))?;
        let mut fields = serde_json::Map::new();
        for f in &table.fields {
            fields.insert(f.name.clone(), json!(emit::define_field(name, f, false)));
        }
        let mut indexes = serde_json::Map::new();
        for i in &table.indexes {
            indexes.insert(i.name.clone(), json!(emit::define_index(name, i, false)));
        }
        let mut events = serde_json::Map::new();
        for e in &table.events {
            events.insert(e.name.clone(), json!(emit::define_event(name, e, false)));
        }
        Some(json!({ "fields": fields, "indexes": indexes, "events": events }))
    }

    fn apply_statement(&mut self, stmt: &str) -> Result<()> {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            return Ok(());
        }
        let upper = stmt.to_uppercase();
        if upper.starts_with("REMOVE") {
            return self.apply_remove(stmt);
        }
        if upper.starts_with("ALTER") {
            return self.apply_rename(stmt);
        }
        if upper.starts_with("DEFINE TABLE") {
            let t = table::parse_table_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            if t.is_relation() {
                self.schema.relations.insert(t.name.clone(), t);
            } else {
                self.schema.tables.insert(t.name.clone(), t);
            }
            return Ok(());
        }
        if upper.starts_with("DEFINE FIELD") {
            let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
            let f = field::parse_field_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
            t.fields.retain(|existing| existing.name != f.name);
            t.fields.push(f);
            return Ok(());
        }
        if upper.starts_with("DEFINE INDEX") {
            let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
            let i = index::parse_index_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
            t.indexes.retain(|existing| existing.name != i.name);
            t.indexes.push(i);
            return Ok(());
        }
        if upper.starts_with("DEFINE EVENT") {
            let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
            let e = event::parse_event_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
            t.events.retain(|existing| existing.name != e.name);
            t.events.push(e);
            return Ok(());
        }
        if upper.starts_with("DEFINE FUNCTION") {
            let f = function::parse_function_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            self.schema.functions.insert(f.name.clone(), f);
            return Ok(());
        }
        if upper.starts_with("DEFINE ANALYZER") {
            let a = analyzer::parse_analyzer_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            self.schema.analyzers.insert(a.name.clone(), a);
            return Ok(());
        }
        if upper.starts_with("DEFINE ACCESS") {
            let a = access_method::parse_access_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            self.schema.access_methods.insert(a.name.clone(), a);
            return Ok(());
        }
        if upper.starts_with("DEFINE PARAM") {
            let p = param::parse_param_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            self.schema.params.insert(p.name.clone(), p);
            return Ok(());
        }
        if upper.starts_with("DEFINE SEQUENCE") {
            let s = sequence::parse_sequence_ddl(stmt).ok_or_else(|| apply_err(stmt))?;
            self.schema.sequences.insert(s.name.clone(), s);
            return Ok(());
        }
        Err(apply_err(stmt))
    }

    fn apply_remove(&mut self, stmt: &str) -> Result<()> {
        let caps = REMOVE_STMT.captures(stmt).ok_or_else(|| apply_err(stmt))?;
        let kind = caps[1].to_uppercase();
        let name = caps[2].to_string();
        match kind.as_str() {
            "TABLE" => {
                self.schema.tables.remove(&name);
                self.schema.relations.remove(&name);
            }
            "FIELD" => {
                let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
                let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
                t.fields.retain(|f| f.name != name);
            }
            "INDEX" => {
                let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
                let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
                t.indexes.retain(|i| i.name != name);
            }
            "EVENT" => {
                let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
                let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
                t.events.retain(|e| e.name != name);
            }
            "FUNCTION" => {
                self.schema.functions.remove(&name);
            }
            "ANALYZER" => {
                self.schema.analyzers.remove(&name);
            }
            "ACCESS" => {
                self.schema.access_methods.remove(&name);
            }
            "PARAM" => {
                self.schema.params.remove(&name);
            }
            "SEQUENCE" => {
                self.schema.sequences.remove(&name);
            }
            _ => return Err(apply_err(stmt)),
        }
        Ok(())
    }

    fn apply_rename(&mut self, stmt: &str) -> Result<()> {
        let caps = ALTER_STMT.captures(stmt).ok_or_else(|| apply_err(stmt))?;
        let kind = caps[1].to_uppercase();
        let old = caps[2].to_string();
        let new = caps[3].to_string();
        match kind.as_str() {
            "TABLE" => {
                if let Some(mut t) = self.schema.tables.remove(&old) {
                    t.name = new.clone();
                    self.schema.tables.insert(new, t);
                } else if let Some(mut t) = self.schema.relations.remove(&old) {
                    t.name = new.clone();
                    self.schema.relations.insert(new, t);
                } else {
                    return Err(apply_err(stmt));
                }
            }
            "FIELD" => {
                let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
                let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
                let f = t.fields.iter_mut().find(|f| f.name == old).ok_or_else(|| apply_err(stmt))?;
                f.name = new;
            }
            "INDEX" => {
                let tbl = on_table(stmt).ok_or_else(|| apply_err(stmt))?;
                let t = self.table_mut(&tbl).ok_or_else(|| apply_err(stmt))?;
                let i = t.indexes.iter_mut().find(|i| i.name == old).ok_or_else(|| apply_err(stmt))?;
                i.name = new;
            }
            "ANALYZER" => {
                let mut a = self.schema.analyzers.remove(&old).ok_or_else(|| apply_err(stmt))?;
                a.name = new.clone();
                self.schema.analyzers.insert(new, a);
            }
            _ => return Err(apply_err(stmt)),
        }
        Ok(())
    }
}

impl DatabaseClient for MockClient {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn execute_query(&mut self, query: &str) -> Result<Vec<Row>> {
        self.require_connected()?;
        let trimmed = query.trim();
        let upper = trimmed.to_uppercase();
        if upper.starts_with("INFO FOR DB") {
            return Ok(vec![self.info_for_db()]);
        }
        if let Some(caps) = INFO_FOR_TABLE.captures(trimmed) {
            let name = caps[1].to_string();
            return Ok(vec![self.info_for_table(&name).unwrap_or_else(|| json!({}))]);
        }

        let mut results = Vec::new();
        for (idx, stmt) in split_statements(trimmed).into_iter().enumerate() {
            self.apply_statement(&stmt).map_err(|e| reindex(e, idx + 1))?;
            results.push(Value::Null);
        }
        Ok(results)
    }

    fn create(&mut self, table: &str, data: serde_json::Value) -> Result<Row> {
        self.require_connected()?;
        let mut record = data;
        if let Value::Object(ref mut map) = record {
            let id = format!("{table}:{}", self.ledger.len() + 1);
            map.entry("id").or_insert_with(|| json!(id));
        }
        self.ledger.push(record.clone());
        Ok(record)
    }

    fn select(&mut self, target: &str) -> Result<Vec<Row>> {
        self.require_connected()?;
        if target.contains(':') {
            return Ok(self
                .ledger
                .iter()
                .filter(|r| r.get("id").and_then(Value::as_str) == Some(target))
                .cloned()
                .collect());
        }
        Ok(self.ledger.clone())
    }

    fn delete(&mut self, target: &str) -> Result<()> {
        self.require_connected()?;
        if target.contains(':') {
            self.ledger.retain(|r| r.get("id").and_then(Value::as_str) != Some(target));
        } else {
            self.ledger.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Schema;

    #[test]
    fn applies_define_and_remove_statements() {
        let mut client = MockClient::new();
        client.connect().unwrap();
        client
            .execute_query("DEFINE TABLE user TYPE NORMAL SCHEMAFULL;\nDEFINE FIELD email ON TABLE user TYPE string;")
            .unwrap();
        assert!(client.schema().tables.contains_key("user"));
        assert_eq!(client.schema().tables["user"].fields.len(), 1);

        client.execute_query("REMOVE FIELD email ON TABLE user;").unwrap();
        assert!(client.schema().tables["user"].fields.is_empty());

        client.execute_query("REMOVE TABLE user;").unwrap();
        assert!(!client.schema().tables.contains_key("user"));
    }

    #[test]
    fn renames_a_field_in_place() {
        let mut client = MockClient::new();
        client.connect().unwrap();
        client.execute_query("DEFINE TABLE post TYPE NORMAL SCHEMAFULL;").unwrap();
        client.execute_query("DEFINE FIELD title ON TABLE post TYPE string;").unwrap();
        client.execute_query("ALTER FIELD title ON TABLE post RENAME headline;").unwrap();
        assert_eq!(client.schema().tables["post"].fields[0].name, "headline");
    }

    #[test]
    fn info_for_db_round_trips_through_the_live_parser() {
        let schema = Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of("string")))
            .build()
            .unwrap();
        let mut client = MockClient::seeded(schema);
        client.connect().unwrap();
        let info = client.execute_query("INFO FOR DB;").unwrap();
        let tables = info[0].get("tables").and_then(Value::as_object).unwrap();
        assert!(tables.contains_key("user"));

        let table_info = client.execute_query("INFO FOR TABLE user;").unwrap();
        let fields = table_info[0].get("fields").and_then(Value::as_object).unwrap();
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn create_select_delete_round_trip_ledger_rows() {
        let mut client = MockClient::new();
        client.connect().unwrap();
        let row = client.create("_migrations", json!({ "up": "DEFINE TABLE x;" })).unwrap();
        let id = row.get("id").and_then(Value::as_str).unwrap().to_string();
        let rows = client.select("_migrations").unwrap();
        assert_eq!(rows.len(), 1);
        client.delete(&id).unwrap();
        assert!(client.select("_migrations").unwrap().is_empty());
    }

    #[test]
    fn operating_without_connect_is_an_error() {
        let mut client = MockClient::new();
        assert!(client.execute_query("DEFINE TABLE x;").is_err());
    }
}
