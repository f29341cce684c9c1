// src/db/mod.rs

//! Database client contract and backends. [`client::DatabaseClient`]
//! is the narrow interface the differ/migrator consume; [`mock::MockClient`]
//! is an in-memory stand-in for tests and `smig test`; `surreal::SurrealClient`
//! (behind the `surreal-client` feature) talks to a real database.

pub mod client;
pub mod mock;
#[cfg(feature = "surreal-client")]
pub mod surreal;

use serde_json::Value;

use crate::ledger::MIGRATIONS_TABLE;
use crate::parse::{LiveInfo, LiveTableInfo};

use client::DatabaseClient;

/// Splits a `;`-joined batch of statements on top-level semicolons only —
/// ones outside `'...'` string literals and outside `{ ... }` bodies, so a
/// function or event definition's own embedded statements don't get cut.
/// Shared by [`mock::MockClient`] and, behind the `surreal-client` feature,
/// by [`surreal::SurrealClient`] (which needs the per-statement count to
/// pull matching results out of a `surrealdb` response).
pub(crate) fn split_statements(query: &str) -> Vec<String> {
    let mut stmts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut escape = false;
    let mut start = 0usize;
    for (i, c) in query.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_quote => escape = true,
            '\'' => in_quote = !in_quote,
            '{' if !in_quote => depth += 1,
            '}' if !in_quote => depth -= 1,
            ';' if !in_quote && depth <= 0 => {
                stmts.push(query[start..=i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = query[start..].trim();
    if !tail.is_empty() {
        stmts.push(tail.to_string());
    }
    stmts
}

fn as_str_map(value: &Value) -> std::collections::BTreeMap<String, String> {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Introspects the live database into a [`LiveInfo`] via `INFO FOR DB` /
/// `INFO FOR TABLE <name>`, the same shape a real SurrealDB connection
/// reports. The ledger's own table is dropped from the result: it is
/// implicitly excluded from the diff.
pub fn introspect(client: &mut dyn DatabaseClient) -> crate::error::Result<LiveInfo> {
    let db_info = client.execute_query("INFO FOR DB;")?;
    let db_info = db_info.into_iter().next().unwrap_or(Value::Null);

    let mut tables = as_str_map(db_info.get("tables").unwrap_or(&Value::Null));
    tables.remove(MIGRATIONS_TABLE);

    let mut table_info = std::collections::BTreeMap::new();
    for name in tables.keys() {
        let rows = client.execute_query(&format!("INFO FOR TABLE {name};"))?;
        let info = rows.into_iter().next().unwrap_or(Value::Null);
        table_info.insert(
            name.clone(),
            LiveTableInfo {
                fields: as_str_map(info.get("fields").unwrap_or(&Value::Null)),
                indexes: as_str_map(info.get("indexes").unwrap_or(&Value::Null)),
                events: as_str_map(info.get("events").unwrap_or(&Value::Null)),
            },
        );
    }

    Ok(LiveInfo {
        tables,
        table_info,
        functions: as_str_map(db_info.get("functions").unwrap_or(&Value::Null)),
        analyzers: as_str_map(db_info.get("analyzers").unwrap_or(&Value::Null)),
        access_methods: as_str_map(db_info.get("accesses").unwrap_or(&Value::Null)),
        params: as_str_map(db_info.get("params").unwrap_or(&Value::Null)),
        sequences: as_str_map(db_info.get("sequences").unwrap_or(&Value::Null)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockClient;
    use crate::ir::Schema;

    #[test]
    fn introspect_drops_the_ledger_table() {
        let schema = Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of("string")))
            .build()
            .unwrap();
        let mut client = MockClient::seeded(schema);
        client.connect().unwrap();
        client.execute_query(crate::ledger::LEDGER_SCHEMA_DDL).unwrap();

        let info = introspect(&mut client).unwrap();
        assert!(info.tables.contains_key("user"));
        assert!(!info.tables.contains_key(MIGRATIONS_TABLE));
    }
}
