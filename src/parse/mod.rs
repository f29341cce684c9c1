// src/parse/mod.rs

//! Introspection parser: turns the live database's DDL text, as
//! reported by `INFO FOR DB` / `INFO FOR TABLE <name>`, back into a
//! [`Schema`]. Each entity kind gets its own regex-driven extractor; a
//! brace-depth scanner (`util::scan_braced_block`) pulls out `VALUE`/`THEN`
//! bodies without tripping over nested braces or braces inside strings.

pub mod access_method;
pub mod analyzer;
pub mod event;
pub mod field;
pub mod function;
pub mod index;
pub mod param;
pub mod sequence;
pub mod table;
mod util;

use std::collections::BTreeMap;

use tracing::warn;

use crate::ir::{AccessMethod, Analyzer, Event, Field, Function, Index, Param, Schema, Sequence, Table};

/// Raw DDL text for one table's body, as returned by `INFO FOR TABLE <name>`.
#[derive(Debug, Clone, Default)]
pub struct LiveTableInfo {
    pub fields: BTreeMap<String, String>,
    pub indexes: BTreeMap<String, String>,
    pub events: BTreeMap<String, String>,
}

/// Raw DDL text for an entire database: `INFO FOR DB`'s per-kind maps, plus
/// one [`LiveTableInfo`] per table name it lists.
#[derive(Debug, Clone, Default)]
pub struct LiveInfo {
    pub tables: BTreeMap<String, String>,
    pub table_info: BTreeMap<String, LiveTableInfo>,
    pub functions: BTreeMap<String, String>,
    pub analyzers: BTreeMap<String, String>,
    pub access_methods: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub sequences: BTreeMap<String, String>,
}

/// Reconstructs a [`Schema`] from raw introspection DDL.
///
/// A statement this parser cannot make sense of is logged at `warn` and
/// recovered as an `unknown`-flagged placeholder carrying just the name,
/// rather than dropped or aborting the whole pass. The differ compares an
/// unknown entity by name only, so it neither vanishes (which would
/// surface as a spurious `Create`) nor gets diffed field-by-field against
/// a body we couldn't actually reconstruct.
pub fn parse_schema(info: &LiveInfo) -> Schema {
    let mut schema = Schema::default();

    for (name, ddl) in &info.tables {
        let mut table = table::parse_table_ddl(ddl).unwrap_or_else(|| {
            warn!(table = %name, "could not parse DEFINE TABLE statement, recovering as unknown");
            Table::unknown(name.clone())
        });

        if !table.unknown {
            if let Some(body) = info.table_info.get(name) {
                for (field_name, field_ddl) in &body.fields {
                    let field = field::parse_field_ddl(field_ddl).unwrap_or_else(|| {
                        warn!(table = %name, field = %field_name, "could not parse DEFINE FIELD statement, recovering as unknown");
                        Field::unknown(field_name.clone())
                    });
                    table.fields.push(field);
                }
                for (index_name, index_ddl) in &body.indexes {
                    let index = index::parse_index_ddl(index_ddl).unwrap_or_else(|| {
                        warn!(table = %name, index = %index_name, "could not parse DEFINE INDEX statement, recovering as unknown");
                        Index::unknown(index_name.clone())
                    });
                    table.indexes.push(index);
                }
                for (event_name, event_ddl) in &body.events {
                    let event = event::parse_event_ddl(event_ddl).unwrap_or_else(|| {
                        warn!(table = %name, event = %event_name, "could not parse DEFINE EVENT statement, recovering as unknown");
                        Event::unknown(event_name.clone())
                    });
                    table.events.push(event);
                }
            }
        }

        if table.is_relation() {
            schema.relations.insert(name.clone(), table);
        } else {
            schema.tables.insert(name.clone(), table);
        }
    }

    for (name, ddl) in &info.functions {
        let function = function::parse_function_ddl(ddl).unwrap_or_else(|| {
            warn!(function = %name, "could not parse DEFINE FUNCTION statement, recovering as unknown");
            Function::unknown(name.clone())
        });
        schema.functions.insert(name.clone(), function);
    }
    for (name, ddl) in &info.analyzers {
        let analyzer = analyzer::parse_analyzer_ddl(ddl).unwrap_or_else(|| {
            warn!(analyzer = %name, "could not parse DEFINE ANALYZER statement, recovering as unknown");
            Analyzer::unknown(name.clone())
        });
        schema.analyzers.insert(name.clone(), analyzer);
    }
    for (name, ddl) in &info.access_methods {
        let access = access_method::parse_access_ddl(ddl).unwrap_or_else(|| {
            warn!(access_method = %name, "could not parse DEFINE ACCESS statement, recovering as unknown");
            AccessMethod::unknown(name.clone())
        });
        schema.access_methods.insert(name.clone(), access);
    }
    for (name, ddl) in &info.params {
        let param = param::parse_param_ddl(ddl).unwrap_or_else(|| {
            warn!(param = %name, "could not parse DEFINE PARAM statement, recovering as unknown");
            Param::unknown(name.clone())
        });
        schema.params.insert(name.clone(), param);
    }
    for (name, ddl) in &info.sequences {
        let sequence = sequence::parse_sequence_ddl(ddl).unwrap_or_else(|| {
            warn!(sequence = %name, "could not parse DEFINE SEQUENCE statement, recovering as unknown");
            Sequence::unknown(name.clone())
        });
        schema.sequences.insert(name.clone(), sequence);
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_schema_from_live_ddl() {
        let mut info = LiveInfo::default();
        info.tables.insert("user".to_string(), "DEFINE TABLE user SCHEMAFULL PERMISSIONS FULL;".to_string());
        let mut user_body = LiveTableInfo::default();
        user_body.fields.insert(
            "email".to_string(),
            "DEFINE FIELD email ON TABLE user TYPE string ASSERT $value != NONE;".to_string(),
        );
        user_body
            .indexes
            .insert("email_ix".to_string(), "DEFINE INDEX email_ix ON TABLE user FIELDS email UNIQUE;".to_string());
        info.table_info.insert("user".to_string(), user_body);
        info.params.insert("apiTimeout".to_string(), "DEFINE PARAM $apiTimeout VALUE 30s;".to_string());

        let schema = parse_schema(&info);

        assert_eq!(schema.tables.len(), 1);
        let user = &schema.tables["user"];
        assert_eq!(user.fields.len(), 1);
        assert_eq!(user.indexes.len(), 1);
        assert_eq!(schema.params["apiTimeout"].value, "30s");
    }

    #[test]
    fn recovers_unparseable_table_as_unknown_without_panicking() {
        let mut info = LiveInfo::default();
        info.tables.insert("garbage".to_string(), "not a define statement at all".to_string());
        let schema = parse_schema(&info);
        let table = &schema.tables["garbage"];
        assert!(table.unknown);
        assert!(table.fields.is_empty());
    }
}
