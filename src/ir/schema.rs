// src/ir/schema.rs

use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::access_method::{AccessMethod, AccessMethodBuilder, AccessMethodKind};
use super::analyzer::{Analyzer, AnalyzerBuilder};
use super::function::{Function, FunctionBuilder};
use super::index::IndexKind;
use super::param::{Param, ParamBuilder};
use super::sequence::{Sequence, SequenceBuilder};
use super::table::{Table, TableBuilder};

/// The root of the schema IR: unordered collections, each
/// keyed by name. `BTreeMap` gives alphabetic iteration order for free,
/// which doubles as the differ's tie-breaking rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,
    pub relations: BTreeMap<String, Table>,
    pub functions: BTreeMap<String, Function>,
    pub analyzers: BTreeMap<String, Analyzer>,
    pub access_methods: BTreeMap<String, AccessMethod>,
    pub params: BTreeMap<String, Param>,
    pub sequences: BTreeMap<String, Sequence>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Every table-like entity (tables and relations together), keyed by
    /// name, as the differ needs to treat them as one dependency space.
    pub fn all_tables(&self) -> BTreeMap<&str, &Table> {
        self.tables
            .iter()
            .chain(self.relations.iter())
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// Minimal build-time validation ("deeper semantic validation is the
    /// responsibility of the database at apply time").
    fn validate(&self) -> Result<()> {
        for (name, table) in self.all_tables() {
            if name.trim().is_empty() {
                return Err(Error::Build("table name must not be empty".into()));
            }
            if let Some(was) = &table.was {
                if self.all_tables().contains_key(was.as_str()) {
                    return Err(Error::Build(format!(
                        "table {name:?} declares was({was:?}) but {was:?} is also a currently desired name"
                    )));
                }
            }
            for field in &table.fields {
                if field.name.trim().is_empty() {
                    return Err(Error::Build(format!("table {name} has a field with an empty name")));
                }
                for prev in &field.was {
                    if table.fields.iter().any(|f| &f.name == prev) {
                        return Err(Error::Build(format!(
                            "field {}.{} declares was({prev:?}) which collides with a current field name",
                            name, field.name
                        )));
                    }
                }
            }
            for index in &table.indexes {
                if index.kind == IndexKind::Search {
                    if let Some(analyzer) = &index.params.analyzer {
                        if !self.analyzers.contains_key(analyzer) {
                            return Err(Error::Build(format!(
                                "index {}.{} references analyzer {analyzer:?} which does not exist in this schema",
                                name, index.name
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Fluent builder for [`Schema`]. Each entity-adding method takes a closure
/// configuring the entity's own builder, mirroring the nested-chain shape
/// of the per-entity builders.
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        SchemaBuilder { schema: Schema::default() }
    }

    pub fn table(mut self, name: impl Into<String>, f: impl FnOnce(TableBuilder) -> TableBuilder) -> Self {
        let name = name.into();
        let built = f(TableBuilder::new(name.clone())).build();
        self.schema.tables.insert(name, built);
        self
    }

    pub fn relation(mut self, name: impl Into<String>, f: impl FnOnce(TableBuilder) -> TableBuilder) -> Self {
        let name = name.into();
        let built = f(TableBuilder::new(name.clone())).build();
        self.schema.relations.insert(name, built);
        self
    }

    pub fn function(mut self, name: impl Into<String>, f: impl FnOnce(FunctionBuilder) -> FunctionBuilder) -> Self {
        let built = f(FunctionBuilder::new(name)).build();
        self.schema.functions.insert(built.name.clone(), built);
        self
    }

    pub fn analyzer(mut self, name: impl Into<String>, f: impl FnOnce(AnalyzerBuilder) -> AnalyzerBuilder) -> Self {
        let name = name.into();
        let built = f(AnalyzerBuilder::new(name.clone())).build();
        self.schema.analyzers.insert(name, built);
        self
    }

    pub fn access_method(
        mut self,
        name: impl Into<String>,
        kind: AccessMethodKind,
        f: impl FnOnce(AccessMethodBuilder) -> AccessMethodBuilder,
    ) -> Self {
        let name = name.into();
        let built = f(AccessMethodBuilder::new(name.clone(), kind)).build();
        self.schema.access_methods.insert(name, built);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>, f: impl FnOnce(ParamBuilder) -> ParamBuilder) -> Self {
        let built = f(ParamBuilder::new(name, value)).build();
        self.schema.params.insert(built.name.clone(), built);
        self
    }

    pub fn sequence(mut self, name: impl Into<String>, f: impl FnOnce(SequenceBuilder) -> SequenceBuilder) -> Self {
        let name = name.into();
        let built = f(SequenceBuilder::new(name.clone())).build();
        self.schema.sequences.insert(name, built);
        self
    }

    pub fn build(self) -> Result<Schema> {
        self.schema.validate()?;
        Ok(self.schema)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::field::OnDelete;

    #[test]
    fn builds_a_simple_schema() {
        let schema = Schema::builder()
            .table("user", |t| {
                t.field("email", |f| f.type_of("string").required())
                    .field("name", |f| f.type_of("string"))
                    .index("email", |i| i.columns(["email"]).unique())
            })
            .build()
            .unwrap();

        assert_eq!(schema.tables.len(), 1);
        let user = &schema.tables["user"];
        assert_eq!(user.fields.len(), 2);
        assert_eq!(user.indexes.len(), 1);
    }

    #[test]
    fn rejects_was_colliding_with_current_name() {
        let result = Schema::builder()
            .table("user", |t| t)
            .table("account", |t| t.was("user"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_search_index_without_matching_analyzer() {
        let result = Schema::builder()
            .table("post", |t| t.index("body_ix", |i| i.columns(["body"]).search("missing")))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn relation_owns_edge_endpoints() {
        let schema = Schema::builder()
            .table("user", |t| t)
            .table("post", |t| t)
            .relation("wrote", |t| t.edge("user", "post", None).field("at", |f| f.type_of("datetime")))
            .build()
            .unwrap();

        let wrote = &schema.relations["wrote"];
        assert!(wrote.is_relation());
        assert_eq!(wrote.edge.as_ref().unwrap().from, "user");
    }

    #[test]
    fn field_on_delete_parses() {
        assert_eq!(OnDelete::parse("cascade"), Some(OnDelete::Cascade));
    }
}
