// src/emit/mod.rs

//! DDL Emitter: a pure function from a [`ChangeSet`] to a `(up, down)`
//! pair of DDL strings. Every renderer below is a plain string builder —
//! no I/O, no randomness, no timestamps — so the same `ChangeSet` always
//! produces byte-identical output.
//!
//! Renames are emitted as a single `ALTER ... RENAME` directive rather
//! than a drop+create pair ("rename preservation"). A table or
//! field that is both renamed and otherwise modified in the same
//! operation only gets the rename statement here — the differ does not
//! currently detect a combined rename+modify, so there is nothing else to
//! emit for that case (see DESIGN.md).

use crate::diff::{Change, ChangeSet};
use crate::ir::{AccessMethod, AccessMethodKind, Analyzer, Event, Field, Function, Index, IndexKind, IndexParams, Param, Schemafulness, Sequence, Table, TableKind, TypeExpr};

/// Renders a `ChangeSet` into forward (`up`) and reverse (`down`) DDL.
pub fn emit(changes: &ChangeSet) -> (String, String) {
    let up = render_statements(&changes.forward);
    let down = render_statements(&changes.reversed());
    (up, down)
}

fn render_statements(changes: &[Change]) -> String {
    changes.iter().flat_map(render_change).collect::<Vec<_>>().join("\n")
}

fn render_change(change: &Change) -> Vec<String> {
    match change {
        Change::DropField { table, field } => vec![remove_field(table, &field.name)],
        Change::DropEvent { table, event } => vec![remove_event(table, &event.name)],
        Change::DropIndex { table, index } => vec![remove_index(table, &index.name)],
        Change::DropTable { table } => vec![remove_table(&table.name)],
        Change::DropRelation { relation } => vec![remove_table(&relation.name)],
        Change::DropFunction { function } => vec![remove_function(&function.name)],
        Change::DropAnalyzer { analyzer } => vec![remove_analyzer(&analyzer.name)],
        Change::DropAccessMethod { access } => vec![remove_access(&access.name)],
        Change::DropParam { param } => vec![remove_param(&param.name)],
        Change::DropSequence { sequence } => vec![remove_sequence(&sequence.name)],

        Change::CreateAnalyzer { analyzer } => vec![define_analyzer(analyzer, false)],
        Change::RenameAnalyzer { from, analyzer } => vec![alter_rename("ANALYZER", None, from, &analyzer.name)],

        Change::CreateTable { table } => vec![define_table(table, false)],
        Change::RenameTable { from, table } => vec![alter_rename("TABLE", None, from, &table.name)],
        Change::ModifyTable { new, .. } => vec![define_table(new, true)],
        Change::CreateRelation { relation } => vec![define_table(relation, false)],
        Change::RenameRelation { from, relation } => vec![alter_rename("TABLE", None, from, &relation.name)],
        Change::ModifyRelation { new, .. } => vec![define_table(new, true)],

        Change::CreateField { table, field } => vec![define_field(table, field, false)],
        Change::RenameField { table, from, field } => {
            vec![alter_rename("FIELD", Some(table), from, &field.name)]
        }
        Change::ModifyField { table, new, .. } => vec![define_field(table, new, true)],

        Change::CreateIndex { table, index } => vec![define_index(table, index, false)],
        Change::RenameIndex { table, from, index } => {
            vec![alter_rename("INDEX", Some(table), from, &index.name)]
        }
        Change::ModifyIndex { table, new, .. } => vec![define_index(table, new, true)],
        Change::RecreateIndex { table, old, new } => {
            vec![remove_index(table, &old.name), define_index(table, new, false)]
        }

        Change::CreateEvent { table, event } => vec![define_event(table, event, false)],
        Change::ModifyEvent { table, new, .. } => vec![define_event(table, new, true)],

        Change::CreateFunction { function } => vec![define_function(function, false)],
        Change::ModifyFunction { new, .. } => vec![define_function(new, true)],
        Change::CreateAccessMethod { access } => vec![define_access(access, false)],
        Change::ModifyAccessMethod { new, .. } => vec![define_access(new, true)],
        Change::CreateParam { param } => vec![define_param(param, false)],
        Change::ModifyParam { new, .. } => vec![define_param(new, true)],
        Change::CreateSequence { sequence } => vec![define_sequence(sequence, false)],
        Change::ModifySequence { new, .. } => vec![define_sequence(new, true)],
    }
}

fn alter_rename(kind: &str, table_scope: Option<&str>, from: &str, to: &str) -> String {
    match table_scope {
        Some(table) => format!("ALTER {kind} {from} ON TABLE {table} RENAME {to};"),
        None => format!("ALTER {kind} {from} RENAME {to};"),
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Serializes a stored default/value expression: expression
/// shapes (containing `::`, `(`, or equal to `NONE`/`NULL`/`true`/`false`)
/// and arrays/objects emit verbatim; numbers emit verbatim; everything
/// else is single-quoted with internal quotes escaped.
fn render_literal_or_expr(v: &str) -> String {
    let v = v.trim();
    let upper = v.to_uppercase();
    if v.contains("::") || v.contains('(') || upper == "NONE" || upper == "NULL" || upper == "TRUE" || upper == "FALSE"
    {
        return v.to_string();
    }
    if (v.starts_with('[') && v.ends_with(']')) || (v.starts_with('{') && v.ends_with('}')) {
        return v.to_string();
    }
    if v.parse::<f64>().is_ok() {
        return v.to_string();
    }
    let unquoted = v.trim_matches(|c| c == '\'' || c == '"');
    quote_string(unquoted)
}

fn render_permissions(perms: &[(String, String)]) -> Option<String> {
    if perms.is_empty() {
        return None;
    }
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (op, expr) in perms {
        match groups.iter_mut().find(|(e, _)| e == expr) {
            Some(g) => g.1.push(op.clone()),
            None => groups.push((expr.clone(), vec![op.clone()])),
        }
    }
    let rendered: Vec<String> = groups.iter().map(|(expr, ops)| format!("FOR {} {}", ops.join(", "), expr)).collect();
    Some(rendered.join(", "))
}

// --- tables / relations ---

pub(crate) fn define_table(table: &Table, overwrite: bool) -> String {
    let mut s = String::from("DEFINE TABLE");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push(' ');
    s.push_str(&table.name);

    match (&table.kind, &table.edge) {
        (TableKind::Edge, Some(edge)) => {
            s.push_str(" TYPE RELATION IN ");
            s.push_str(&edge.from);
            s.push_str(" OUT ");
            s.push_str(&edge.to);
            if let Some(enforced) = edge.enforced {
                s.push_str(if enforced { " ENFORCED" } else { " NOT ENFORCED" });
            }
        }
        (TableKind::Any, _) => s.push_str(" TYPE ANY"),
        _ => s.push_str(" TYPE NORMAL"),
    }

    s.push(' ');
    s.push_str(match table.schemafulness {
        Schemafulness::Full => "SCHEMAFULL",
        Schemafulness::Less => "SCHEMALESS",
    });

    if table.drop {
        s.push_str(" DROP");
    }

    if let Some(cf) = &table.change_feed {
        s.push_str(" CHANGEFEED ");
        s.push_str(&cf.expiry);
        if cf.include_original {
            s.push_str(" INCLUDE ORIGINAL");
        }
    }

    if let Some(perms) = render_permissions(&table.permissions) {
        s.push_str(" PERMISSIONS ");
        s.push_str(&perms);
    }

    if !table.comment.is_empty() {
        s.push_str(" COMMENT ");
        s.push_str(&quote_string(&table.comment.join(" ")));
    }

    s.push(';');
    s
}

fn remove_table(name: &str) -> String {
    format!("REMOVE TABLE {name};")
}

// --- fields ---

pub(crate) fn define_field(table: &str, field: &Field, overwrite: bool) -> String {
    let mut s = String::from("DEFINE FIELD");
    if overwrite {
        s.push_str(" OVERWRITE");
    } else if field.if_not_exists {
        s.push_str(" IF NOT EXISTS");
    }
    s.push(' ');
    s.push_str(&field.name);
    s.push_str(" ON TABLE ");
    s.push_str(table);

    if field.flexible {
        s.push_str(" FLEXIBLE");
    }

    s.push_str(" TYPE ");
    if field.optional && !matches!(field.type_expr, TypeExpr::Option(_)) {
        s.push_str(&format!("option<{}>", field.type_expr));
    } else {
        s.push_str(&field.type_expr.to_string());
    }

    if field.readonly {
        s.push_str(" READONLY");
    }

    if let Some(default) = &field.default {
        s.push_str(" DEFAULT");
        if field.default_always {
            s.push_str(" ALWAYS");
        }
        s.push(' ');
        s.push_str(&render_literal_or_expr(default));
    }

    if let Some(computed) = &field.computed {
        s.push_str(" COMPUTED ");
        s.push_str(computed);
    } else if let Some(value) = &field.value {
        s.push_str(" VALUE ");
        s.push_str(value);
    }

    if let Some(assert) = field.combined_assert() {
        s.push_str(" ASSERT ");
        s.push_str(&assert);
    }

    if field.permissions != "FULL" {
        s.push_str(" PERMISSIONS ");
        s.push_str(&field.permissions);
    }

    if let Some(reference) = &field.references {
        s.push_str(" REFERENCE");
        if let Some(on_delete) = reference.on_delete {
            s.push_str(" ON DELETE ");
            s.push_str(on_delete.as_str());
        }
    }

    if !field.comment.is_empty() {
        s.push_str(" COMMENT ");
        s.push_str(&quote_string(&field.comment.join(" ")));
    }

    s.push(';');
    s
}

fn remove_field(table: &str, name: &str) -> String {
    format!("REMOVE FIELD {name} ON TABLE {table};")
}

// --- indexes ---

pub(crate) fn define_index(table: &str, index: &Index, overwrite: bool) -> String {
    let mut s = String::from("DEFINE INDEX");
    if overwrite {
        s.push_str(" OVERWRITE");
    } else if index.if_not_exists {
        s.push_str(" IF NOT EXISTS");
    }
    s.push(' ');
    s.push_str(&index.name);
    s.push_str(" ON TABLE ");
    s.push_str(table);
    s.push_str(" FIELDS ");
    s.push_str(&index.columns.join(", "));

    if index.unique {
        s.push_str(" UNIQUE");
    }

    match index.kind {
        IndexKind::Btree => {}
        IndexKind::Hash => s.push_str(" HASH"),
        IndexKind::Search => push_search_params(&mut s, &index.params),
        IndexKind::Mtree => {
            s.push_str(" MTREE");
            push_vector_params(&mut s, &index.params);
            if let Some(capacity) = index.params.capacity {
                s.push_str(&format!(" CAPACITY {capacity}"));
            }
        }
        IndexKind::Hnsw => {
            s.push_str(" HNSW");
            push_vector_params(&mut s, &index.params);
            if let Some(efc) = index.params.efc {
                s.push_str(&format!(" EFC {efc}"));
            }
            if let Some(m) = index.params.m {
                s.push_str(&format!(" M {m}"));
            }
            if let Some(m0) = index.params.m0 {
                s.push_str(&format!(" M0 {m0}"));
            }
            if let Some(lm) = index.params.lm {
                s.push_str(&format!(" LM {lm}"));
            }
        }
    }

    if index.concurrently {
        s.push_str(" CONCURRENTLY");
    }

    if !index.comment.is_empty() {
        s.push_str(" COMMENT ");
        s.push_str(&quote_string(&index.comment.join(" ")));
    }

    s.push(';');
    s
}

/// `SEARCH` renders as `FULLTEXT` (never `SEARCH`).
fn push_search_params(s: &mut String, params: &IndexParams) {
    s.push_str(" FULLTEXT");
    if let Some(analyzer) = &params.analyzer {
        s.push_str(" ANALYZER ");
        s.push_str(analyzer);
    }
    if params.highlights {
        s.push_str(" HIGHLIGHTS");
    }
    if let Some((k1, b)) = params.bm25 {
        s.push_str(&format!(" BM25({k1},{b})"));
    }
}

fn push_vector_params(s: &mut String, params: &IndexParams) {
    if let Some(dim) = params.dimension {
        s.push_str(&format!(" DIMENSION {dim}"));
    }
    if let Some(dist) = params.dist {
        s.push_str(" DIST ");
        s.push_str(dist.as_str());
    }
}

fn remove_index(table: &str, name: &str) -> String {
    format!("REMOVE INDEX {name} ON TABLE {table};")
}

// --- events ---

pub(crate) fn define_event(table: &str, event: &Event, overwrite: bool) -> String {
    let mut s = String::from("DEFINE EVENT");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push(' ');
    s.push_str(&event.name);
    s.push_str(" ON TABLE ");
    s.push_str(table);
    if let Some(when) = &event.when {
        s.push_str(" WHEN ");
        s.push_str(when);
    }
    s.push_str(" THEN ");
    s.push_str(&event.then);
    s.push(';');
    s
}

fn remove_event(table: &str, name: &str) -> String {
    format!("REMOVE EVENT {name} ON TABLE {table};")
}

// --- functions ---

pub(crate) fn define_function(function: &Function, overwrite: bool) -> String {
    let mut s = String::from("DEFINE FUNCTION");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push(' ');
    s.push_str(&function.name);
    s.push('(');
    let params: Vec<String> = function.params.iter().map(|(n, t)| format!("${n}: {t}")).collect();
    s.push_str(&params.join(", "));
    s.push(')');
    if let Some(returns) = &function.returns {
        s.push_str(" -> ");
        s.push_str(returns);
    }
    s.push_str(" { ");
    s.push_str(function.body.trim());
    s.push_str(" }");
    if let Some(perms) = &function.permissions {
        s.push_str(" PERMISSIONS ");
        s.push_str(perms);
    }
    s.push(';');
    s
}

fn remove_function(name: &str) -> String {
    format!("REMOVE FUNCTION {name};")
}

// --- access methods ---

pub(crate) fn define_access(access: &AccessMethod, overwrite: bool) -> String {
    let mut s = String::from("DEFINE ACCESS");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push(' ');
    s.push_str(&access.name);
    s.push_str(" TYPE ");
    s.push_str(match access.kind {
        AccessMethodKind::Jwt => "JWT",
        AccessMethodKind::Record => "RECORD",
        AccessMethodKind::Bearer => "BEARER",
    });

    if let Some(signup) = &access.signup {
        s.push_str(" SIGNUP (");
        s.push_str(signup);
        s.push(')');
    }
    if let Some(signin) = &access.signin {
        s.push_str(" SIGNIN (");
        s.push_str(signin);
        s.push(')');
    }
    if let Some(authenticate) = &access.authenticate {
        s.push_str(" AUTHENTICATE (");
        s.push_str(authenticate);
        s.push(')');
    }
    if let Some(session) = &access.session {
        s.push_str(" SESSION ");
        s.push_str(session);
    }
    if let Some(duration) = &access.token_duration {
        s.push_str(" DURATION FOR TOKEN ");
        s.push_str(duration);
    }

    s.push(';');
    s
}

fn remove_access(name: &str) -> String {
    format!("REMOVE ACCESS {name};")
}

// --- analyzers ---

pub(crate) fn define_analyzer(analyzer: &Analyzer, overwrite: bool) -> String {
    let mut s = String::from("DEFINE ANALYZER");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push(' ');
    s.push_str(&analyzer.name);
    if !analyzer.tokenizers.is_empty() {
        s.push_str(" TOKENIZERS ");
        s.push_str(&analyzer.tokenizers.join(","));
    }
    if !analyzer.filters.is_empty() {
        s.push_str(" FILTERS ");
        s.push_str(&analyzer.filters.join(","));
    }
    if let Some(function) = &analyzer.function {
        s.push_str(" FUNCTION ");
        s.push_str(function);
    }
    s.push(';');
    s
}

fn remove_analyzer(name: &str) -> String {
    format!("REMOVE ANALYZER {name};")
}

// --- params ---

pub(crate) fn define_param(param: &Param, overwrite: bool) -> String {
    let mut s = String::from("DEFINE PARAM");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push_str(" $");
    s.push_str(&param.name);
    s.push_str(" VALUE ");
    s.push_str(&render_literal_or_expr(&param.value));
    if let Some(comment) = &param.comment {
        s.push_str(" COMMENT ");
        s.push_str(&quote_string(comment));
    }
    s.push(';');
    s
}

fn remove_param(name: &str) -> String {
    format!("REMOVE PARAM ${name};")
}

// --- sequences ---

pub(crate) fn define_sequence(sequence: &Sequence, overwrite: bool) -> String {
    let mut s = String::from("DEFINE SEQUENCE");
    if overwrite {
        s.push_str(" OVERWRITE");
    }
    s.push(' ');
    s.push_str(&sequence.name);
    if let Some(start) = sequence.start {
        s.push_str(&format!(" START {start}"));
    }
    if let Some(batch) = sequence.batch {
        s.push_str(&format!(" BATCH {batch}"));
    }
    if let Some(timeout) = &sequence.timeout {
        s.push_str(" TIMEOUT ");
        s.push_str(timeout);
    }
    s.push(';');
    s
}

fn remove_sequence(name: &str) -> String {
    format!("REMOVE SEQUENCE {name};")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Schema;

    #[test]
    fn initial_apply_matches_scenario_s1() {
        let schema = Schema::builder()
            .table("user", |t| {
                t.field("email", |f| f.type_of("string").required())
                    .field("name", |f| f.type_of("string"))
                    .index("email", |i| i.columns(["email"]).unique())
            })
            .build()
            .unwrap();
        let changes = crate::diff::diff(&schema, &Schema::default());
        let (up, down) = emit(&changes);

        assert!(up.contains("DEFINE TABLE user TYPE NORMAL SCHEMAFULL;"));
        assert!(up.contains("DEFINE FIELD email ON TABLE user TYPE string ASSERT $value != NONE;"));
        assert!(up.contains("DEFINE FIELD name ON TABLE user TYPE string;"));
        assert!(up.contains("DEFINE INDEX email ON TABLE user FIELDS email UNIQUE;"));

        let down_lines: Vec<&str> = down.lines().collect();
        assert_eq!(down_lines.last(), Some(&"REMOVE TABLE user;"));
        assert!(down.contains("REMOVE FIELD email ON TABLE user;"));
        assert!(down.contains("REMOVE FIELD name ON TABLE user;"));
        assert!(down.contains("REMOVE INDEX email ON TABLE user;"));
    }

    #[test]
    fn index_parameter_change_forces_recreate_matching_s4() {
        let desired = Schema::builder()
            .table("post", |t| {
                t.index("vec_ix", |i| {
                    i.vector(crate::ir::IndexKind::Hnsw, 4, crate::ir::DistanceMetric::Cosine).m(16)
                })
            })
            .build()
            .unwrap();
        let live = Schema::builder()
            .table("post", |t| {
                t.index("vec_ix", |i| {
                    i.vector(crate::ir::IndexKind::Hnsw, 4, crate::ir::DistanceMetric::Cosine).m(12)
                })
            })
            .build()
            .unwrap();
        let changes = crate::diff::diff(&desired, &live);
        let (up, _) = emit(&changes);
        assert!(up.contains("REMOVE INDEX vec_ix ON TABLE post;"));
        assert!(up.contains("M 16"));
    }

    #[test]
    fn field_rename_emits_alter_not_drop_create() {
        let desired = Schema::builder()
            .table("user", |t| t.field("displayName", |f| f.type_of("string").was("name")))
            .build()
            .unwrap();
        let live = Schema::builder().table("user", |t| t.field("name", |f| f.type_of("string"))).build().unwrap();
        let changes = crate::diff::diff(&desired, &live);
        let (up, _) = emit(&changes);
        assert!(up.contains("ALTER FIELD name ON TABLE user RENAME displayName;"));
        assert!(!up.contains("REMOVE FIELD name"));
    }

    #[test]
    fn permissions_default_produces_no_clause() {
        let schema = Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of("string")))
            .build()
            .unwrap();
        let changes = crate::diff::diff(&schema, &Schema::default());
        let (up, _) = emit(&changes);
        assert!(!up.contains("PERMISSIONS"));
    }

    #[test]
    fn default_float_emits_verbatim() {
        let field = crate::ir::FieldBuilder::new("score").type_of("float").default("3.14").build();
        let ddl = define_field("stats", &field, false);
        assert!(ddl.contains("DEFAULT 3.14"));
    }

    #[test]
    fn default_plain_string_is_single_quoted() {
        let field = crate::ir::FieldBuilder::new("status").type_of("string").default("active").build();
        let ddl = define_field("user", &field, false);
        assert!(ddl.contains("DEFAULT 'active'"));
    }

    #[test]
    fn emit_is_deterministic() {
        let schema = Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of("string").required()))
            .build()
            .unwrap();
        let changes = crate::diff::diff(&schema, &Schema::default());
        let (up1, down1) = emit(&changes);
        let (up2, down2) = emit(&changes);
        assert_eq!(up1, up2);
        assert_eq!(down1, down2);
    }
}
