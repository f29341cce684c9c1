// src/ir/table.rs

use super::event::{Event, EventBuilder, TriggerType};
use super::field::{Field, FieldBuilder};
use super::index::{Index, IndexBuilder};

/// Table schemafulness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schemafulness {
    Full,
    Less,
}

/// Table kind, matching the three forms the database accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Normal,
    Any,
    Edge,
}

/// Change-feed configuration (`CHANGEFEED <expiry> [INCLUDE ORIGINAL]`).
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFeed {
    pub expiry: String,
    pub include_original: bool,
}

/// Graph-edge endpoints for a relation ("tables with graph-edge
/// semantics").
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub enforced: Option<bool>,
}

/// A table or relation. Plain tables have `edge: None`; relations have it
/// populated. Both forms own the same body (fields, indexes, events,
/// permissions, comments, rename history).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub schemafulness: Schemafulness,
    pub kind: TableKind,
    pub drop: bool,
    pub change_feed: Option<ChangeFeed>,
    /// Ordered `(operation, expression)` pairs, e.g. `("select", "FULL")`.
    pub permissions: Vec<(String, String)>,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
    pub events: Vec<Event>,
    pub comment: Vec<String>,
    pub was: Option<String>,
    pub edge: Option<EdgeSpec>,
    /// Set when this table was reconstructed from live DDL the parser
    /// couldn't make sense of. The differ compares such a table by name
    /// only and never descends into its (necessarily empty) body.
    pub unknown: bool,
}

impl Table {
    fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            schemafulness: Schemafulness::Full,
            kind: TableKind::Normal,
            drop: false,
            change_feed: None,
            permissions: Vec::new(),
            fields: Vec::new(),
            indexes: Vec::new(),
            events: Vec::new(),
            comment: Vec::new(),
            was: None,
            edge: None,
            unknown: false,
        }
    }

    /// A placeholder standing in for a table whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        let mut table = Table::new(name);
        table.unknown = true;
        table
    }

    pub fn is_relation(&self) -> bool {
        self.edge.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }
}

/// Fluent builder for [`Table`] (and, with `.edge(...)`, for relations).
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        TableBuilder { table: Table::new(name) }
    }

    pub fn schemaless(mut self) -> Self {
        self.table.schemafulness = Schemafulness::Less;
        self
    }

    pub fn kind(mut self, kind: TableKind) -> Self {
        self.table.kind = kind;
        self
    }

    pub fn drop(mut self) -> Self {
        self.table.drop = true;
        self
    }

    pub fn change_feed(mut self, expiry: impl Into<String>, include_original: bool) -> Self {
        self.table.change_feed = Some(ChangeFeed { expiry: expiry.into(), include_original });
        self
    }

    pub fn permission(mut self, op: impl Into<String>, expr: impl Into<String>) -> Self {
        self.table.permissions.push((op.into(), expr.into()));
        self
    }

    pub fn field(mut self, name: impl Into<String>, f: impl FnOnce(FieldBuilder) -> FieldBuilder) -> Self {
        let built = f(FieldBuilder::new(name)).build();
        self.table.fields.push(built);
        self
    }

    pub fn index(mut self, name: impl Into<String>, f: impl FnOnce(IndexBuilder) -> IndexBuilder) -> Self {
        let built = f(IndexBuilder::new(name)).build();
        self.table.indexes.push(built);
        self
    }

    pub fn event(
        mut self,
        name: impl Into<String>,
        trigger: TriggerType,
        f: impl FnOnce(EventBuilder) -> EventBuilder,
    ) -> Self {
        let built = f(EventBuilder::new(name, trigger)).build();
        self.table.events.push(built);
        self
    }

    pub fn comment(mut self, c: impl Into<String>) -> Self {
        self.table.comment.push(c.into());
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.table.was = Some(name.into());
        self
    }

    /// Marks this table as a relation with the given graph-edge endpoints.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>, enforced: Option<bool>) -> Self {
        self.table.kind = TableKind::Edge;
        self.table.edge = Some(EdgeSpec { from: from.into(), to: to.into(), enforced });
        self
    }

    pub fn build(self) -> Table {
        self.table
    }
}
