// src/diff/mod.rs

//! Differ: compares a normalized desired [`Schema`] against a
//! normalized live [`Schema`] and produces an ordered [`ChangeSet`].
//!
//! Entities are keyed in `BTreeMap`s throughout the IR, so iterating them
//! already yields alphabetic order — the tie-break rule falls out of the
//! data structure rather than needing an explicit sort pass.

pub mod change;

use std::collections::{BTreeMap, BTreeSet};

use crate::ir::{AccessMethod, Analyzer, Event, Field, Function, Index, IndexParams, Param, Schema, Sequence, Table};

pub use change::{Change, ChangeSet};

/// Computes the forward `ChangeSet` needed to turn `live` into `desired`.
pub fn diff(desired: &Schema, live: &Schema) -> ChangeSet {
    let mut forward = Vec::new();

    let live_table_keys: BTreeSet<String> = live.all_tables().keys().map(|k| k.to_string()).collect();
    let live_analyzer_keys: BTreeSet<String> = live.analyzers.keys().cloned().collect();

    let table_renames = resolve_table_renames(desired, &live_table_keys);
    let analyzer_renames = resolve_renames(&desired.analyzers, &live_analyzer_keys, |a| a.was.clone());

    let consumed_tables: BTreeSet<String> = table_renames.values().cloned().collect();
    let consumed_analyzers: BTreeSet<String> = analyzer_renames.values().cloned().collect();

    // Step 2: explicit drop of events/indexes belonging to tables that will
    // disappear entirely (not matched by a rename).
    for (name, table) in live.all_tables() {
        let name = name.to_string();
        if desired.all_tables().contains_key(name.as_str()) || consumed_tables.contains(&name) {
            continue;
        }
        for event in &table.events {
            forward.push(Change::DropEvent { table: name.clone(), event: event.clone() });
        }
        for index in &table.indexes {
            forward.push(Change::DropIndex { table: name.clone(), index: index.clone() });
        }
    }

    // Step 3: drop whole entities marked for drop, reverse-dependency order:
    // tables, relations, functions, analyzers, access methods, params, sequences.
    for (name, table) in &live.tables {
        if !desired.tables.contains_key(name) && !consumed_tables.contains(name) {
            forward.push(Change::DropTable { table: table.clone() });
        }
    }
    for (name, relation) in &live.relations {
        if !desired.relations.contains_key(name) && !consumed_tables.contains(name) {
            forward.push(Change::DropRelation { relation: relation.clone() });
        }
    }
    for (name, function) in &live.functions {
        if !desired.functions.contains_key(name) {
            forward.push(Change::DropFunction { function: function.clone() });
        }
    }
    for (name, analyzer) in &live.analyzers {
        if !desired.analyzers.contains_key(name) && !consumed_analyzers.contains(name) {
            forward.push(Change::DropAnalyzer { analyzer: analyzer.clone() });
        }
    }
    for (name, access) in &live.access_methods {
        if !desired.access_methods.contains_key(name) {
            forward.push(Change::DropAccessMethod { access: access.clone() });
        }
    }
    for (name, param) in &live.params {
        if !desired.params.contains_key(name) {
            forward.push(Change::DropParam { param: param.clone() });
        }
    }
    for (name, sequence) in &live.sequences {
        if !desired.sequences.contains_key(name) {
            forward.push(Change::DropSequence { sequence: sequence.clone() });
        }
    }

    // Step 4: create/rename analyzers (indexes in step 7 may depend on them).
    for (name, analyzer) in &desired.analyzers {
        match analyzer_renames.get(name) {
            Some(old) => forward.push(Change::RenameAnalyzer { from: old.clone(), analyzer: analyzer.clone() }),
            None => {
                if !live.analyzers.contains_key(name) {
                    forward.push(Change::CreateAnalyzer { analyzer: analyzer.clone() });
                }
            }
        }
    }

    // Step 5: create/rename/modify tables and relations, alphabetic across both maps.
    for (name, table) in desired.all_tables() {
        let is_relation = desired.relations.contains_key(name);
        match table_renames.get(name) {
            Some(old) => push_table_rename(&mut forward, is_relation, old.clone(), table.clone()),
            None => match live.all_tables().get(name) {
                None => push_table_create(&mut forward, is_relation, table.clone()),
                Some(live_table) => {
                    if !tables_equivalent(table, live_table) {
                        push_table_modify(&mut forward, is_relation, (*live_table).clone(), table.clone());
                    }
                }
            },
        }
    }

    // Steps 6-8: per-table fields, indexes, events.
    for (name, desired_table) in desired.all_tables() {
        let live_table = table_renames
            .get(name)
            .and_then(|old| live.all_tables().get(old.as_str()).copied())
            .or_else(|| live.all_tables().get(name).copied());

        diff_fields(name, desired_table, live_table, &mut forward);
        diff_indexes(name, desired_table, live_table, &mut forward);
        diff_events(name, desired_table, live_table, &mut forward);
    }

    // Step 9: create/modify functions, access methods, params, sequences. Per
    // spec these four kinds are not subject to rename detection (unlike
    // tables, fields, indexes and analyzers): a name change surfaces as a
    // drop paired with a create.
    diff_plain(&desired.functions, &live.functions, &mut forward, functions_equivalent, |f| Change::CreateFunction {
        function: f.clone(),
    }, |old, new| Change::ModifyFunction { old: old.clone(), new: new.clone() });

    diff_plain(
        &desired.access_methods,
        &live.access_methods,
        &mut forward,
        access_methods_equivalent,
        |a| Change::CreateAccessMethod { access: a.clone() },
        |old, new| Change::ModifyAccessMethod { old: old.clone(), new: new.clone() },
    );

    diff_plain(&desired.params, &live.params, &mut forward, params_equivalent, |p| Change::CreateParam {
        param: p.clone(),
    }, |old, new| Change::ModifyParam { old: old.clone(), new: new.clone() });

    diff_plain(&desired.sequences, &live.sequences, &mut forward, sequences_equivalent, |s| Change::CreateSequence {
        sequence: s.clone(),
    }, |old, new| Change::ModifySequence { old: old.clone(), new: new.clone() });

    ChangeSet { forward }
}

fn push_table_create(out: &mut Vec<Change>, is_relation: bool, table: Table) {
    if is_relation {
        out.push(Change::CreateRelation { relation: table });
    } else {
        out.push(Change::CreateTable { table });
    }
}

fn push_table_rename(out: &mut Vec<Change>, is_relation: bool, from: String, table: Table) {
    if is_relation {
        out.push(Change::RenameRelation { from, relation: table });
    } else {
        out.push(Change::RenameTable { from, table });
    }
}

fn push_table_modify(out: &mut Vec<Change>, is_relation: bool, old: Table, new: Table) {
    if is_relation {
        out.push(Change::ModifyRelation { old, new });
    } else {
        out.push(Change::ModifyTable { old, new });
    }
}

/// Finds, for each desired table/relation, the live name it was renamed
/// from (if any), searching both `tables` and `relations` since a rename
/// can, in principle, cross the table/relation boundary.
fn resolve_table_renames(desired: &Schema, live_keys: &BTreeSet<String>) -> BTreeMap<String, String> {
    let mut renames = BTreeMap::new();
    for (name, table) in desired.all_tables() {
        if let Some(was) = &table.was {
            if let Some(old) = find_rename_one(Some(was), name, live_keys) {
                renames.insert(name.to_string(), old);
            }
        }
    }
    renames
}

fn resolve_renames<T>(
    desired: &BTreeMap<String, T>,
    live_keys: &BTreeSet<String>,
    was_of: impl Fn(&T) -> Vec<String>,
) -> BTreeMap<String, String> {
    let mut renames = BTreeMap::new();
    for (name, item) in desired {
        if let Some(old) = find_rename_many(&was_of(item), name, live_keys) {
            renames.insert(name.clone(), old);
        }
    }
    renames
}

fn find_rename_one(was: Option<&String>, new_name: &str, live_keys: &BTreeSet<String>) -> Option<String> {
    let was = was?;
    if live_keys.contains(was) && !live_keys.contains(new_name) {
        Some(was.clone())
    } else {
        None
    }
}

fn find_rename_many(was: &[String], new_name: &str, live_keys: &BTreeSet<String>) -> Option<String> {
    was.iter().find(|old| live_keys.contains(old.as_str()) && !live_keys.contains(new_name)).cloned()
}

/// Generic create/modify diff for entity kinds that don't support rename
/// detection (functions, access methods, params, sequences).
fn diff_plain<T: Clone>(
    desired: &BTreeMap<String, T>,
    live: &BTreeMap<String, T>,
    out: &mut Vec<Change>,
    equivalent: impl Fn(&T, &T) -> bool,
    make_create: impl Fn(&T) -> Change,
    make_modify: impl Fn(&T, &T) -> Change,
) {
    for (name, item) in desired {
        match live.get(name) {
            None => out.push(make_create(item)),
            Some(live_item) => {
                if !equivalent(item, live_item) {
                    out.push(make_modify(live_item, item));
                }
            }
        }
    }
}

fn diff_fields(table: &str, desired_table: &Table, live_table: Option<&Table>, out: &mut Vec<Change>) {
    if live_table.is_some_and(|t| t.unknown) {
        return;
    }
    let live_fields: BTreeMap<String, &Field> =
        live_table.map(|t| t.fields.iter().map(|f| (f.name.clone(), f)).collect()).unwrap_or_default();
    let desired_fields: BTreeMap<String, &Field> = desired_table.fields.iter().map(|f| (f.name.clone(), f)).collect();
    let live_keys: BTreeSet<String> = live_fields.keys().cloned().collect();

    let renames = resolve_renames(
        &desired_fields.iter().map(|(k, v)| (k.clone(), (*v).clone())).collect(),
        &live_keys,
        |f| f.was.clone(),
    );
    let consumed: BTreeSet<String> = renames.values().cloned().collect();

    for (name, field) in &desired_fields {
        match renames.get(name) {
            Some(old) => out.push(Change::RenameField { table: table.to_string(), from: old.clone(), field: (*field).clone() }),
            None => match live_fields.get(name) {
                None => out.push(Change::CreateField { table: table.to_string(), field: (*field).clone() }),
                Some(live_field) => {
                    if !fields_equivalent(field, live_field) {
                        out.push(Change::ModifyField {
                            table: table.to_string(),
                            old: (*live_field).clone(),
                            new: (*field).clone(),
                        });
                    }
                }
            },
        }
    }

    for (name, field) in &live_fields {
        if !desired_fields.contains_key(name) && !consumed.contains(name) {
            out.push(Change::DropField { table: table.to_string(), field: (*field).clone() });
        }
    }
}

fn diff_indexes(table: &str, desired_table: &Table, live_table: Option<&Table>, out: &mut Vec<Change>) {
    if live_table.is_some_and(|t| t.unknown) {
        return;
    }
    let live_indexes: BTreeMap<String, &Index> =
        live_table.map(|t| t.indexes.iter().map(|i| (i.name.clone(), i)).collect()).unwrap_or_default();
    let desired_indexes: BTreeMap<String, &Index> = desired_table.indexes.iter().map(|i| (i.name.clone(), i)).collect();
    let live_keys: BTreeSet<String> = live_indexes.keys().cloned().collect();

    let renames = resolve_renames(
        &desired_indexes.iter().map(|(k, v)| (k.clone(), (*v).clone())).collect(),
        &live_keys,
        |i| i.was.clone(),
    );
    let consumed: BTreeSet<String> = renames.values().cloned().collect();

    for (name, index) in &desired_indexes {
        match renames.get(name) {
            Some(old) => out.push(Change::RenameIndex { table: table.to_string(), from: old.clone(), index: (*index).clone() }),
            None => match live_indexes.get(name) {
                None => out.push(Change::CreateIndex { table: table.to_string(), index: (*index).clone() }),
                Some(live_index) => {
                    if index_needs_recreate(index, live_index) {
                        out.push(Change::RecreateIndex {
                            table: table.to_string(),
                            old: (*live_index).clone(),
                            new: (*index).clone(),
                        });
                    } else if !live_index.unknown && index.comment != live_index.comment {
                        out.push(Change::ModifyIndex {
                            table: table.to_string(),
                            old: (*live_index).clone(),
                            new: (*index).clone(),
                        });
                    }
                }
            },
        }
    }

    for (name, index) in &live_indexes {
        if !desired_indexes.contains_key(name) && !consumed.contains(name) {
            out.push(Change::DropIndex { table: table.to_string(), index: (*index).clone() });
        }
    }
}

fn diff_events(table: &str, desired_table: &Table, live_table: Option<&Table>, out: &mut Vec<Change>) {
    if live_table.is_some_and(|t| t.unknown) {
        return;
    }
    let live_events: BTreeMap<String, &Event> =
        live_table.map(|t| t.events.iter().map(|e| (e.name.clone(), e)).collect()).unwrap_or_default();
    let desired_events: BTreeMap<String, &Event> = desired_table.events.iter().map(|e| (e.name.clone(), e)).collect();

    for (name, event) in &desired_events {
        match live_events.get(name) {
            None => out.push(Change::CreateEvent { table: table.to_string(), event: (*event).clone() }),
            Some(live_event) => {
                if !events_equivalent(event, live_event) {
                    out.push(Change::ModifyEvent {
                        table: table.to_string(),
                        old: (*live_event).clone(),
                        new: (*event).clone(),
                    });
                }
            }
        }
    }

    for (name, event) in &live_events {
        if !desired_events.contains_key(name) {
            out.push(Change::DropEvent { table: table.to_string(), event: (*event).clone() });
        }
    }
}

/// Table-level comparison dimensions: everything except `name`, `was` and
/// the field/index/event sub-lists (diffed separately). An unknown entity
/// on either side is compared by name alone: its body couldn't be
/// reconstructed, so treating it as equivalent avoids manufacturing a
/// `Modify` out of nothing but default placeholder values.
fn tables_equivalent(a: &Table, b: &Table) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.schemafulness == b.schemafulness
        && a.kind == b.kind
        && a.drop == b.drop
        && a.change_feed == b.change_feed
        && a.permissions == b.permissions
        && a.comment == b.comment
        && a.edge == b.edge
}

/// Field comparison. The eight named dimensions (type, readonly,
/// flexible, default, value, assert, permissions, comment) are supplemented
/// here with `optional`, `computed`, `default_always` and `references` so a
/// change to any of those surfaces as a `Modify` rather than being silently
/// dropped.
fn fields_equivalent(a: &Field, b: &Field) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.type_expr == b.type_expr
        && a.optional == b.optional
        && a.readonly == b.readonly
        && a.flexible == b.flexible
        && a.default == b.default
        && a.value == b.value
        && a.computed == b.computed
        && a.default_always == b.default_always
        && a.combined_assert() == b.combined_assert()
        && a.permissions == b.permissions
        && a.comment == b.comment
        && a.references == b.references
}

/// True when `columns`, `unique`, `kind` or any kind-specific parameter
/// differs — indexes are immutable with respect to those attributes, so
/// such a change must be expressed as `REMOVE INDEX; DEFINE INDEX …`.
fn index_needs_recreate(a: &Index, b: &Index) -> bool {
    if a.unknown || b.unknown {
        return false;
    }
    a.columns != b.columns || a.unique != b.unique || a.kind != b.kind || !index_params_equivalent(&a.params, &b.params)
}

fn index_params_equivalent(a: &IndexParams, b: &IndexParams) -> bool {
    a == b
}

fn events_equivalent(a: &Event, b: &Event) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.trigger == b.trigger && a.when == b.when && a.then == b.then
}

fn functions_equivalent(a: &Function, b: &Function) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.params == b.params && a.returns == b.returns && a.body == b.body && a.permissions == b.permissions
}

fn access_methods_equivalent(a: &AccessMethod, b: &AccessMethod) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.kind == b.kind
        && a.session == b.session
        && a.token_duration == b.token_duration
        && a.signup == b.signup
        && a.signin == b.signin
        && a.authenticate == b.authenticate
}

fn params_equivalent(a: &Param, b: &Param) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.value == b.value && a.comment == b.comment
}

fn sequences_equivalent(a: &Sequence, b: &Sequence) -> bool {
    if a.unknown || b.unknown {
        return true;
    }
    a.start == b.start && a.batch == b.batch && a.timeout == b.timeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::field::OnDelete;

    fn schema_with_user_email() -> Schema {
        Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of("string").required()))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_diff_for_identical_schemas() {
        let schema = schema_with_user_email();
        let changes = diff(&schema, &schema);
        assert!(changes.is_empty());
    }

    #[test]
    fn creates_a_new_table() {
        let desired = schema_with_user_email();
        let live = Schema::default();
        let changes = diff(&desired, &live);
        assert!(changes.forward.iter().any(|c| matches!(c, Change::CreateTable { table } if table.name == "user")));
        assert!(changes.forward.iter().any(|c| matches!(c, Change::CreateField { table, field } if table == "user" && field.name == "email")));
    }

    #[test]
    fn detects_table_rename_via_was() {
        let desired = Schema::builder().table("accounts", |t| t.was("user")).build().unwrap();
        let live = schema_with_user_email();
        let changes = diff(&desired, &live);
        assert!(changes.forward.iter().any(|c| matches!(c, Change::RenameTable { from, table } if from == "user" && table.name == "accounts")));
        assert!(!changes.forward.iter().any(|c| matches!(c, Change::DropTable { .. })));
    }

    #[test]
    fn drops_table_absent_from_desired() {
        let desired = Schema::default();
        let live = schema_with_user_email();
        let changes = diff(&desired, &live);
        assert!(changes.forward.iter().any(|c| matches!(c, Change::DropTable { table } if table.name == "user")));
    }

    #[test]
    fn modifies_field_type_change() {
        let desired = Schema::builder()
            .table("user", |t| t.field("age", |f| f.type_of("int")))
            .build()
            .unwrap();
        let live = Schema::builder()
            .table("user", |t| t.field("age", |f| f.type_of("string")))
            .build()
            .unwrap();
        let changes = diff(&desired, &live);
        assert!(changes.forward.iter().any(|c| matches!(c, Change::ModifyField { .. })));
    }

    #[test]
    fn index_column_change_forces_recreate() {
        let desired = Schema::builder()
            .table("post", |t| t.index("title_ix", |i| i.columns(["title", "slug"])))
            .build()
            .unwrap();
        let live = Schema::builder()
            .table("post", |t| t.index("title_ix", |i| i.columns(["title"])))
            .build()
            .unwrap();
        let changes = diff(&desired, &live);
        assert!(changes.forward.iter().any(|c| matches!(c, Change::RecreateIndex { .. })));
    }

    #[test]
    fn field_rename_is_not_also_dropped() {
        let desired = Schema::builder()
            .table("user", |t| t.field("email_address", |f| f.type_of("string").was("email")))
            .build()
            .unwrap();
        let live = Schema::builder().table("user", |t| t.field("email", |f| f.type_of("string"))).build().unwrap();
        let changes = diff(&desired, &live);
        assert_eq!(changes.forward.len(), 1);
        assert!(matches!(&changes.forward[0], Change::RenameField { from, .. } if from == "email"));
    }

    #[test]
    fn reversed_changeset_swaps_modify_direction() {
        let desired = Schema::builder()
            .table("account", |t| t.field("status", |f| f.type_of("string").references("user", Some(OnDelete::Cascade))))
            .build()
            .unwrap();
        let live = Schema::builder().table("account", |t| t.field("status", |f| f.type_of("string"))).build().unwrap();
        let changes = diff(&desired, &live);
        let reversed = changes.reversed();
        assert_eq!(changes.forward.len(), reversed.len());
        match (&changes.forward[0], &reversed[0]) {
            (Change::ModifyField { old, new, .. }, Change::ModifyField { old: r_old, new: r_new, .. }) => {
                assert_eq!(old, r_new);
                assert_eq!(new, r_old);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
