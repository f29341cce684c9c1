// src/parse/sequence.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::sequence::{Sequence, SequenceBuilder};

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+sequence\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_]+)"#).unwrap()
});
static START: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bstart\s+(-?\d+)"#).unwrap());
static BATCH: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bbatch\s+(\d+)"#).unwrap());
static TIMEOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\btimeout\s+(\S+)"#).unwrap());

/// Parses a single `DEFINE SEQUENCE ...;` statement as reported by
/// `INFO FOR DB`.
pub fn parse_sequence_ddl(ddl: &str) -> Option<Sequence> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let mut builder = SequenceBuilder::new(name);

    if let Some(caps) = START.captures(ddl) {
        if let Ok(start) = caps.get(1).unwrap().as_str().parse() {
            builder = builder.start(start);
        }
    }
    if let Some(caps) = BATCH.captures(ddl) {
        if let Ok(batch) = caps.get(1).unwrap().as_str().parse() {
            builder = builder.batch(batch);
        }
    }
    if let Some(caps) = TIMEOUT.captures(ddl) {
        builder = builder.timeout(caps.get(1).unwrap().as_str().trim_end_matches(';'));
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sequence_with_all_clauses() {
        let s = parse_sequence_ddl("DEFINE SEQUENCE order_no START 1000 BATCH 50 TIMEOUT 5s;").unwrap();
        assert_eq!(s.name, "order_no");
        assert_eq!(s.start, Some(1000));
        assert_eq!(s.batch, Some(50));
        assert_eq!(s.timeout, Some("5s".to_string()));
    }
}
