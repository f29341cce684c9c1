// src/schema_file.rs

//! Schema source contract: a schema module exports a root `Schema` IR;
//! loading from a file path returns the built IR. A
//! compiled-in schema is just a Rust function the embedding binary calls
//! directly (`my_schema::schema()`); the form that can be loaded from a
//! *path* at runtime, without recompiling, is a declarative TOML document
//! deserialized with `serde`+`toml` into this module's DTOs and then
//! folded into the real IR through the ordinary builders.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ir::{AccessMethodKind, DistanceMetric, IndexKind, OnDelete, Schema};

/// Reads and builds a [`Schema`] from a TOML schema file.
pub fn load_schema_from_file(path: impl AsRef<Path>) -> Result<Schema> {
    let text = std::fs::read_to_string(path)?;
    load_schema_from_str(&text)
}

/// Parses TOML text directly, for callers that already have the content
/// in memory (tests, `init`'s own starter-file round trip).
pub fn load_schema_from_str(text: &str) -> Result<Schema> {
    let doc: SchemaDoc = toml::from_str(text).map_err(|e| Error::SchemaFile(e.to_string()))?;
    doc.into_schema()
}

#[derive(Debug, Default, Deserialize)]
struct SchemaDoc {
    #[serde(default)]
    tables: std::collections::BTreeMap<String, TableDoc>,
    #[serde(default)]
    relations: std::collections::BTreeMap<String, RelationDoc>,
    #[serde(default)]
    functions: std::collections::BTreeMap<String, FunctionDoc>,
    #[serde(default)]
    analyzers: std::collections::BTreeMap<String, AnalyzerDoc>,
    #[serde(default)]
    access_methods: std::collections::BTreeMap<String, AccessMethodDoc>,
    #[serde(default)]
    params: std::collections::BTreeMap<String, ParamDoc>,
    #[serde(default)]
    sequences: std::collections::BTreeMap<String, SequenceDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct TableDoc {
    #[serde(default)]
    schemaless: bool,
    #[serde(default)]
    drop: bool,
    #[serde(default)]
    permissions: Vec<(String, String)>,
    #[serde(default)]
    comment: Vec<String>,
    #[serde(default)]
    fields: std::collections::BTreeMap<String, FieldDoc>,
    #[serde(default)]
    indexes: std::collections::BTreeMap<String, IndexDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct RelationDoc {
    #[serde(rename = "in")]
    from: String,
    #[serde(rename = "out")]
    to: String,
    #[serde(default)]
    enforced: Option<bool>,
    #[serde(flatten)]
    table: TableDoc,
}

#[derive(Debug, Default, Deserialize)]
struct FieldDoc {
    #[serde(rename = "type")]
    type_expr: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    flexible: bool,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    computed: Option<String>,
    #[serde(default)]
    assert: Vec<String>,
    #[serde(default)]
    permissions: Option<String>,
    #[serde(default)]
    comment: Vec<String>,
    #[serde(default)]
    references: Option<String>,
    #[serde(default)]
    on_delete: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IndexDoc {
    columns: Vec<String>,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    analyzer: Option<String>,
    #[serde(default)]
    dimension: Option<u32>,
    #[serde(default)]
    dist: Option<String>,
    #[serde(default)]
    comment: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionDoc {
    #[serde(default)]
    params: Vec<(String, String)>,
    #[serde(default)]
    returns: Option<String>,
    body: String,
    #[serde(default)]
    permissions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzerDoc {
    #[serde(default)]
    tokenizers: Vec<String>,
    #[serde(default)]
    filters: Vec<String>,
    #[serde(default)]
    function: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AccessMethodDoc {
    kind: String,
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    token_duration: Option<String>,
    #[serde(default)]
    signup: Option<String>,
    #[serde(default)]
    signin: Option<String>,
    #[serde(default)]
    authenticate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ParamDoc {
    value: String,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SequenceDoc {
    #[serde(default)]
    start: Option<i64>,
    #[serde(default)]
    batch: Option<u32>,
    #[serde(default)]
    timeout: Option<String>,
}

impl SchemaDoc {
    fn into_schema(self) -> Result<Schema> {
        let mut builder = Schema::builder();

        for (name, doc) in self.tables {
            builder = builder.table(name, |t| doc.apply(t));
        }
        for (name, doc) in self.relations {
            builder = builder.relation(name, |t| {
                let t = doc.table.apply(t);
                t.edge(doc.from, doc.to, doc.enforced)
            });
        }
        for (name, doc) in self.functions {
            builder = builder.function(name, |mut f| {
                for (pname, ptype) in doc.params {
                    f = f.param(pname, ptype);
                }
                if let Some(returns) = doc.returns {
                    f = f.returns(returns);
                }
                f = f.body(doc.body);
                if let Some(perms) = doc.permissions {
                    f = f.permissions(perms);
                }
                f
            });
        }
        for (name, doc) in self.analyzers {
            builder = builder.analyzer(name, |mut a| {
                a = a.tokenizers(doc.tokenizers);
                a = a.filters(doc.filters);
                if let Some(function) = doc.function {
                    a = a.function(function);
                }
                a
            });
        }
        for (name, doc) in self.access_methods {
            let kind = AccessMethodKind::parse(&doc.kind)
                .ok_or_else(|| Error::SchemaFile(format!("access method {name:?} has unknown kind {:?}", doc.kind)))?;
            builder = builder.access_method(name, kind, |mut a| {
                if let Some(session) = doc.session {
                    a = a.session(session);
                }
                if let Some(duration) = doc.token_duration {
                    a = a.token_duration(duration);
                }
                if let Some(signup) = doc.signup {
                    a = a.signup(signup);
                }
                if let Some(signin) = doc.signin {
                    a = a.signin(signin);
                }
                if let Some(authenticate) = doc.authenticate {
                    a = a.authenticate(authenticate);
                }
                a
            });
        }
        for (name, doc) in self.params {
            builder = builder.param(name, doc.value, |mut p| {
                if let Some(comment) = doc.comment {
                    p = p.comment(comment);
                }
                p
            });
        }
        for (name, doc) in self.sequences {
            builder = builder.sequence(name, |mut s| {
                if let Some(start) = doc.start {
                    s = s.start(start);
                }
                if let Some(batch) = doc.batch {
                    s = s.batch(batch);
                }
                if let Some(timeout) = doc.timeout {
                    s = s.timeout(timeout);
                }
                s
            });
        }

        builder.build()
    }
}

impl TableDoc {
    fn apply(self, mut builder: crate::ir::TableBuilder) -> crate::ir::TableBuilder {
        if self.schemaless {
            builder = builder.schemaless();
        }
        if self.drop {
            builder = builder.drop();
        }
        for (op, expr) in self.permissions {
            builder = builder.permission(op, expr);
        }
        for c in self.comment {
            builder = builder.comment(c);
        }
        for (name, field) in self.fields {
            builder = builder.field(name, |f| field.apply(f));
        }
        for (name, index) in self.indexes {
            builder = builder.index(name, |i| index.apply(i));
        }
        builder
    }
}

impl FieldDoc {
    fn apply(self, mut builder: crate::ir::FieldBuilder) -> crate::ir::FieldBuilder {
        builder = builder.type_of(&self.type_expr);
        if self.optional {
            builder = builder.optional();
        }
        if self.readonly {
            builder = builder.readonly();
        }
        if self.flexible {
            builder = builder.flexible();
        }
        if let Some(default) = self.default {
            builder = builder.default(default);
        }
        if let Some(value) = self.value {
            builder = builder.value(value);
        }
        if let Some(computed) = self.computed {
            builder = builder.computed(computed);
        }
        for cond in self.assert {
            builder = builder.assert(cond);
        }
        if let Some(perms) = self.permissions {
            builder = builder.permissions(perms);
        }
        for c in self.comment {
            builder = builder.comment(c);
        }
        if let Some(table) = self.references {
            let on_delete = self.on_delete.as_deref().and_then(OnDelete::parse);
            builder = builder.references(table, on_delete);
        }
        builder
    }
}

impl IndexDoc {
    fn apply(self, mut builder: crate::ir::IndexBuilder) -> crate::ir::IndexBuilder {
        builder = builder.columns(self.columns);
        if self.unique {
            builder = builder.unique();
        }
        match self.kind.as_deref().map(str::to_uppercase).as_deref() {
            Some("HASH") => builder = builder.kind(IndexKind::Hash),
            Some("SEARCH") | Some("FULLTEXT") => {
                builder = builder.search(self.analyzer.unwrap_or_default());
            }
            Some("MTREE") => {
                let dist = self.dist.as_deref().and_then(DistanceMetric::parse).unwrap_or(DistanceMetric::Euclidean);
                builder = builder.vector(IndexKind::Mtree, self.dimension.unwrap_or(0), dist);
            }
            Some("HNSW") => {
                let dist = self.dist.as_deref().and_then(DistanceMetric::parse).unwrap_or(DistanceMetric::Euclidean);
                builder = builder.vector(IndexKind::Hnsw, self.dimension.unwrap_or(0), dist);
            }
            _ => {}
        }
        for c in self.comment {
            builder = builder.comment(c);
        }
        builder
    }
}

/// Renders `schema` back out as a TOML document, the inverse of
/// [`load_schema_from_str`]. Used by `init` to write a starter file, and
/// by tests that check the TOML form round-trips through the builder.
pub fn render_starter_toml() -> String {
    r#"# smig schema file (declarative form).
#
# A compiled-in `fn schema() -> smig::ir::Schema` is the primary form and
# needs no file at all; this TOML form exists for tooling that wants a
# pure-data schema on disk.

[tables.user]
comment = ["created by `smig init`, edit freely"]

[tables.user.fields.email]
type = "string"
assert = ["$value != NONE"]

[tables.user.indexes.email]
columns = ["email"]
unique = true
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_table_with_a_field_and_index() {
        let toml = r#"
            [tables.user.fields.email]
            type = "string"
            assert = ["$value != NONE"]

            [tables.user.indexes.email_ix]
            columns = ["email"]
            unique = true
        "#;
        let schema = load_schema_from_str(toml).unwrap();
        let user = &schema.tables["user"];
        assert_eq!(user.fields.len(), 1);
        assert_eq!(user.fields[0].name, "email");
        assert_eq!(user.indexes[0].columns, vec!["email".to_string()]);
        assert!(user.indexes[0].unique);
    }

    #[test]
    fn starter_toml_parses_back_into_a_schema() {
        let schema = load_schema_from_str(&render_starter_toml()).unwrap();
        assert!(schema.tables.contains_key("user"));
    }

    #[test]
    fn rejects_an_unknown_access_method_kind() {
        let toml = r#"
            [access_methods.api]
            kind = "bogus"
        "#;
        assert!(load_schema_from_str(toml).is_err());
    }
}
