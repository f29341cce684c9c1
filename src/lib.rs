// src/lib.rs

//! smig
//!
//! A schema-migration engine for SurrealDB-like multi-model databases:
//! a desired-state IR is diffed against a live database's introspected
//! schema, and the difference is emitted as forward and reverse DDL,
//! applied under a durable ledger.
//!
//! # Architecture
//!
//! - `ir`: the schema intermediate representation and its builders
//! - `normalize`: canonicalizes IR so structurally-equal schemas compare equal
//! - `parse`: reconstructs IR from a live database's `INFO FOR ...` output
//! - `diff`: computes a minimal, dependency-ordered set of changes
//! - `emit`: renders changes to forward/reverse DDL text
//! - `ledger`: the applied-migrations record and its integrity checksum
//! - `manager`: ties the pipeline together behind one database connection
//! - `db`: the trait a live connection must implement, plus an in-memory mock
//! - `config`: CLI/file/env precedence chain for connection settings
//! - `schema_file`: loads a declarative TOML schema from disk
//! - `mermaid`: renders the IR as a Mermaid ER diagram
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod db;
pub mod diff;
pub mod emit;
pub mod error;
pub mod ir;
pub mod ledger;
pub mod logging;
pub mod manager;
pub mod mermaid;
pub mod normalize;
pub mod parse;
pub mod schema_file;

pub use error::{Error, Result};
