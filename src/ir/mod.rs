// src/ir/mod.rs

//! Schema intermediate representation and fluent builder.
//!
//! The IR is a rooted tree: a [`Schema`] owns named collections of tables,
//! relations, functions, analyzers, access methods, params and sequences.
//! Every entity is built via a chained builder and is immutable once
//! `build()` is called.

pub mod access_method;
pub mod analyzer;
pub mod event;
pub mod field;
pub mod function;
pub mod index;
pub mod param;
pub mod schema;
pub mod sequence;
pub mod table;
pub mod types;

pub use access_method::{AccessMethod, AccessMethodBuilder, AccessMethodKind};
pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use event::{Event, EventBuilder, TriggerType};
pub use field::{Field, FieldBuilder, FieldReference, OnDelete};
pub use function::{Function, FunctionBuilder};
pub use index::{DistanceMetric, Index, IndexBuilder, IndexKind, IndexParams};
pub use param::{Param, ParamBuilder};
pub use schema::{Schema, SchemaBuilder};
pub use sequence::{Sequence, SequenceBuilder};
pub use table::{ChangeFeed, EdgeSpec, Schemafulness, Table, TableBuilder, TableKind};
pub use types::{LiteralValue, Primitive, TypeExpr};
