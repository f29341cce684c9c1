// src/ledger/mod.rs

//! The migration ledger: a record of every migration applied to a
//! database, stored as ordinary rows in the database itself so there is
//! nothing to keep in sync externally. `checksum` guards against a
//! ledger row's `up`/`down` text diverging from what was actually
//! applied ("tampered").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The ledger's table name. Excluded from introspection so it never shows
/// up as a user table in a diff.
pub const MIGRATIONS_TABLE: &str = "_migrations";

/// Schema for the ledger table itself, applied once by
/// [`crate::manager::MigrationManager::initialize`]. Every clause uses
/// `OVERWRITE` rather than `IF NOT EXISTS`: re-running it against an
/// already-initialized database redefines the same shape instead of
/// erroring (see DESIGN.md open question 9).
pub const LEDGER_SCHEMA_DDL: &str = concat!(
    "DEFINE TABLE OVERWRITE _migrations SCHEMAFULL;\n",
    "DEFINE FIELD OVERWRITE appliedAt ON TABLE _migrations TYPE datetime;\n",
    "DEFINE FIELD OVERWRITE up ON TABLE _migrations TYPE string;\n",
    "DEFINE FIELD OVERWRITE down ON TABLE _migrations TYPE string;\n",
    "DEFINE FIELD OVERWRITE checksum ON TABLE _migrations TYPE string;\n",
    "DEFINE FIELD OVERWRITE downChecksum ON TABLE _migrations TYPE string;\n",
    "DEFINE FIELD OVERWRITE message ON TABLE _migrations TYPE option<string>;\n",
);

/// One applied (or about-to-be-applied) migration. `id` is assigned by
/// the database on insert; it is `None` for a record that has been built
/// but not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    #[serde(rename = "appliedAt")]
    pub applied_at: DateTime<Utc>,
    pub up: String,
    pub down: String,
    pub checksum: String,
    #[serde(rename = "downChecksum")]
    pub down_checksum: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl Migration {
    pub fn new(up: String, down: String, message: Option<String>) -> Self {
        Migration {
            id: None,
            applied_at: Utc::now(),
            checksum: checksum(&up),
            down_checksum: checksum(&down),
            up,
            down,
            message,
        }
    }

    /// Whether the stored `up`/`down` text still matches the stored
    /// checksums. A mismatch is a recoverable "tampered" error, not a
    /// silent rollback.
    pub fn is_intact(&self) -> bool {
        self.checksum == checksum(&self.up) && self.down_checksum == checksum(&self.down)
    }
}

/// `sha256.<hex>` over `content`, byte-for-byte. The format is part of
/// the persisted contract, not an implementation detail.
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256.{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic_and_prefixed() {
        let a = checksum("DEFINE TABLE user SCHEMAFULL;");
        let b = checksum("DEFINE TABLE user SCHEMAFULL;");
        assert_eq!(a, b);
        assert!(a.starts_with("sha256."));
        assert_eq!(a.len(), "sha256.".len() + 64);
    }

    #[test]
    fn checksum_differs_on_content_change() {
        assert_ne!(checksum("a"), checksum("b"));
    }

    #[test]
    fn new_migration_is_intact() {
        let m = Migration::new("up sql".to_string(), "down sql".to_string(), None);
        assert!(m.is_intact());
    }

    #[test]
    fn tampering_with_up_breaks_integrity() {
        let mut m = Migration::new("up sql".to_string(), "down sql".to_string(), None);
        m.up = "up sql; DROP TABLE everything;".to_string();
        assert!(!m.is_intact());
    }
}
