// src/error.rs

use thiserror::Error;

/// Core error types for smig.
#[derive(Error, Debug)]
pub enum Error {
    /// Unreachable endpoint, auth failure, or connect timeout.
    #[error("connection error against {url}: {message}")]
    Connection { url: String, message: String },

    /// An unparseable live DDL clause. Callers of the introspection parser
    /// should prefer recovering an `unknown`-flagged entity over bubbling
    /// this up; it exists for cases the parser cannot recover from at all.
    #[error("parse error: {0}")]
    Parse(String),

    /// The database rejected emitted DDL.
    #[error("apply failed on statement {statement_number}: {first_line}")]
    Apply {
        statement_number: usize,
        first_line: String,
    },

    /// Ledger integrity check failed on rollback (checksum mismatch).
    #[error("migration {id} has been tampered with: stored checksum does not match contents")]
    Tampered { id: String },

    /// `rollback -i <id>` referenced a ledger row that does not exist.
    #[error("no migration found with id {0}")]
    UnknownMigration(String),

    /// `--env <name>` referenced a config environment that isn't declared.
    #[error("unknown environment \"{name}\", available: {available:?}")]
    UnknownEnvironment { name: String, available: Vec<String> },

    /// IR construction/build-time validation failure (kept minimal).
    #[error("schema build error: {0}")]
    Build(String),

    /// Config file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors (schema files, config files, starter-file generation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema file (TOML) failed to deserialize into the IR.
    #[error("schema file error: {0}")]
    SchemaFile(String),
}

/// Result type alias using smig's Error type.
pub type Result<T> = std::result::Result<T, Error>;
