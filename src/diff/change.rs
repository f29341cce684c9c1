// src/diff/change.rs

use crate::ir::{AccessMethod, Analyzer, Event, Field, Function, Index, Param, Sequence, Table};

/// A single typed change between the desired schema and the live schema
/// Each variant carries whatever full snapshots the emitter
/// needs both to build the forward DDL and to invert it for the reverse
/// script: `Drop*` carries the entity being removed so the reverse
/// migration can recreate it verbatim, and `Modify*`/`Recreate*` carry
/// both the old (live) and new (desired) snapshot so inversion is a swap
/// rather than a lossy recomputation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    DropField { table: String, field: Field },
    DropEvent { table: String, event: Event },
    DropIndex { table: String, index: Index },
    DropTable { table: Table },
    DropRelation { relation: Table },
    DropFunction { function: Function },
    DropAnalyzer { analyzer: Analyzer },
    DropAccessMethod { access: AccessMethod },
    DropParam { param: Param },
    DropSequence { sequence: Sequence },

    CreateAnalyzer { analyzer: Analyzer },
    RenameAnalyzer { from: String, analyzer: Analyzer },

    CreateTable { table: Table },
    RenameTable { from: String, table: Table },
    ModifyTable { old: Table, new: Table },
    CreateRelation { relation: Table },
    RenameRelation { from: String, relation: Table },
    ModifyRelation { old: Table, new: Table },

    CreateField { table: String, field: Field },
    RenameField { table: String, from: String, field: Field },
    ModifyField { table: String, old: Field, new: Field },

    CreateIndex { table: String, index: Index },
    RenameIndex { table: String, from: String, index: Index },
    ModifyIndex { table: String, old: Index, new: Index },
    RecreateIndex { table: String, old: Index, new: Index },

    CreateEvent { table: String, event: Event },
    ModifyEvent { table: String, old: Event, new: Event },

    CreateFunction { function: Function },
    ModifyFunction { old: Function, new: Function },
    CreateAccessMethod { access: AccessMethod },
    ModifyAccessMethod { old: AccessMethod, new: AccessMethod },
    CreateParam { param: Param },
    ModifyParam { old: Param, new: Param },
    CreateSequence { sequence: Sequence },
    ModifySequence { old: Sequence, new: Sequence },
}

impl Change {
    /// The inverse of this change, used to build the reverse migration
    /// script. `Modify`/`Recreate` invert by swapping old and new;
    /// `Create`/`Drop` invert to each other; `Rename` inverts direction.
    pub fn invert(&self) -> Change {
        match self {
            Change::DropField { table, field } => Change::CreateField { table: table.clone(), field: field.clone() },
            Change::DropEvent { table, event } => Change::CreateEvent { table: table.clone(), event: event.clone() },
            Change::DropIndex { table, index } => Change::CreateIndex { table: table.clone(), index: index.clone() },
            Change::DropTable { table } => Change::CreateTable { table: table.clone() },
            Change::DropRelation { relation } => Change::CreateRelation { relation: relation.clone() },
            Change::DropFunction { function } => Change::CreateFunction { function: function.clone() },
            Change::DropAnalyzer { analyzer } => Change::CreateAnalyzer { analyzer: analyzer.clone() },
            Change::DropAccessMethod { access } => Change::CreateAccessMethod { access: access.clone() },
            Change::DropParam { param } => Change::CreateParam { param: param.clone() },
            Change::DropSequence { sequence } => Change::CreateSequence { sequence: sequence.clone() },

            Change::CreateAnalyzer { analyzer } => Change::DropAnalyzer { analyzer: analyzer.clone() },
            Change::RenameAnalyzer { from, analyzer } => {
                let mut back = analyzer.clone();
                back.name = from.clone();
                Change::RenameAnalyzer { from: analyzer.name.clone(), analyzer: back }
            }

            Change::CreateTable { table } => Change::DropTable { table: table.clone() },
            Change::RenameTable { from, table } => {
                let mut back = table.clone();
                back.name = from.clone();
                Change::RenameTable { from: table.name.clone(), table: back }
            }
            Change::ModifyTable { old, new } => Change::ModifyTable { old: new.clone(), new: old.clone() },
            Change::CreateRelation { relation } => Change::DropRelation { relation: relation.clone() },
            Change::RenameRelation { from, relation } => {
                let mut back = relation.clone();
                back.name = from.clone();
                Change::RenameRelation { from: relation.name.clone(), relation: back }
            }
            Change::ModifyRelation { old, new } => Change::ModifyRelation { old: new.clone(), new: old.clone() },

            Change::CreateField { table, field } => Change::DropField { table: table.clone(), field: field.clone() },
            Change::RenameField { table, from, field } => {
                let mut back = field.clone();
                back.name = from.clone();
                Change::RenameField { table: table.clone(), from: field.name.clone(), field: back }
            }
            Change::ModifyField { table, old, new } => {
                Change::ModifyField { table: table.clone(), old: new.clone(), new: old.clone() }
            }

            Change::CreateIndex { table, index } => Change::DropIndex { table: table.clone(), index: index.clone() },
            Change::RenameIndex { table, from, index } => {
                let mut back = index.clone();
                back.name = from.clone();
                Change::RenameIndex { table: table.clone(), from: index.name.clone(), index: back }
            }
            Change::ModifyIndex { table, old, new } => {
                Change::ModifyIndex { table: table.clone(), old: new.clone(), new: old.clone() }
            }
            Change::RecreateIndex { table, old, new } => {
                Change::RecreateIndex { table: table.clone(), old: new.clone(), new: old.clone() }
            }

            Change::CreateEvent { table, event } => Change::DropEvent { table: table.clone(), event: event.clone() },
            Change::ModifyEvent { table, old, new } => {
                Change::ModifyEvent { table: table.clone(), old: new.clone(), new: old.clone() }
            }

            Change::CreateFunction { function } => Change::DropFunction { function: function.clone() },
            Change::ModifyFunction { old, new } => Change::ModifyFunction { old: new.clone(), new: old.clone() },
            Change::CreateAccessMethod { access } => Change::DropAccessMethod { access: access.clone() },
            Change::ModifyAccessMethod { old, new } => {
                Change::ModifyAccessMethod { old: new.clone(), new: old.clone() }
            }
            Change::CreateParam { param } => Change::DropParam { param: param.clone() },
            Change::ModifyParam { old, new } => Change::ModifyParam { old: new.clone(), new: old.clone() },
            Change::CreateSequence { sequence } => Change::DropSequence { sequence: sequence.clone() },
            Change::ModifySequence { old, new } => Change::ModifySequence { old: new.clone(), new: old.clone() },
        }
    }
}

/// An ordered list of forward changes (the nine-step emission
/// order). The reverse script is `forward.iter().rev().map(Change::invert)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub forward: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn reversed(&self) -> Vec<Change> {
        self.forward.iter().rev().map(Change::invert).collect()
    }
}
