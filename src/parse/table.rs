// src/parse/table.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::table::{Table, TableBuilder, TableKind};

use super::util::unquote;

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+table\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_]+)"#).unwrap()
});
static SCHEMALESS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bschemaless\b"#).unwrap());
static DROP: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bdrop\b"#).unwrap());
static KIND: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\btype\s+(any|normal|relation)\b"#).unwrap());
static IN_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bin\s+([a-zA-Z0-9_]+)"#).unwrap());
static OUT_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bout\s+([a-zA-Z0-9_]+)"#).unwrap());
static ENFORCED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\benforced\b"#).unwrap());
static CHANGEFEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bchangefeed\s+(\S+?)(?:\s*;|\s+include\s+original|\s+permissions|\s+comment|$)"#).unwrap());
static INCLUDE_ORIGINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\binclude\s+original\b"#).unwrap());
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bcomment\s+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#).unwrap());
static PERMISSIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bpermissions\s+(.*?)(?:\s+comment\b|\s*;|$)"#).unwrap());
static FOR_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bfor\b"#).unwrap());
static OP_EXPR_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\b(full|none|where)\b"#).unwrap());

/// Parses a `PERMISSIONS ...` clause body into `(operation, expr)` pairs.
/// A bare `FULL`/`NONE` clause is reported as a single `("*", ...)` pair.
///
/// The regex crate has no look-around, so clauses are split manually: find
/// every `FOR` keyword, each one starts a segment running to the next `FOR`
/// (or the end of the string), then each segment is split at its first
/// `FULL`/`NONE`/`WHERE` keyword into the operation list and the expression.
pub fn parse_permissions_clause(clause: &str) -> Vec<(String, String)> {
    let clause = clause.trim().trim_end_matches(';').trim();
    if clause.is_empty() {
        return Vec::new();
    }
    let upper = clause.to_uppercase();
    if upper == "FULL" || upper == "NONE" {
        return vec![("*".to_string(), upper)];
    }
    let starts: Vec<usize> = FOR_WORD.find_iter(clause).map(|m| m.start()).collect();
    let mut pairs = Vec::new();
    for (idx, &start) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).copied().unwrap_or(clause.len());
        let seg = clause[start + 3..end].trim();
        let Some(kw) = OP_EXPR_SPLIT.find(seg) else { continue };
        let ops = seg[..kw.start()].trim().trim_end_matches(',');
        let expr = seg[kw.start()..].trim().trim_end_matches(',').trim();
        for op in ops.split(',') {
            let op = op.trim().to_lowercase();
            if !op.is_empty() {
                pairs.push((op, expr.to_string()));
            }
        }
    }
    pairs
}

/// Parses a single `DEFINE TABLE ...;` statement as reported by `INFO FOR DB`.
pub fn parse_table_ddl(ddl: &str) -> Option<Table> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let mut builder = TableBuilder::new(name);

    if SCHEMALESS.is_match(ddl) {
        builder = builder.schemaless();
    }

    if DROP.is_match(ddl) {
        builder = builder.drop();
    }

    let kind = KIND.captures(ddl).and_then(|c| c.get(1)).map(|m| m.as_str().to_lowercase());
    match kind.as_deref() {
        Some("relation") => {
            let from = IN_TABLE.captures(ddl).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
            let to = OUT_TABLE.captures(ddl).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
            let enforced = if ENFORCED.is_match(ddl) { Some(true) } else { None };
            if let (Some(from), Some(to)) = (from, to) {
                builder = builder.edge(from, to, enforced);
            } else {
                builder = builder.kind(TableKind::Edge);
            }
        }
        Some("any") => builder = builder.kind(TableKind::Any),
        _ => {}
    }

    if let Some(caps) = CHANGEFEED.captures(ddl) {
        let expiry = caps.get(1).unwrap().as_str().to_string();
        let include_original = INCLUDE_ORIGINAL.is_match(ddl);
        builder = builder.change_feed(expiry, include_original);
    }

    if let Some(caps) = PERMISSIONS.captures(ddl) {
        let clause = caps.get(1).unwrap().as_str();
        for (op, expr) in parse_permissions_clause(clause) {
            builder = builder.permission(op, expr);
        }
    }

    if let Some(caps) = COMMENT.captures(ddl) {
        builder = builder.comment(unquote(caps.get(1).unwrap().as_str()));
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_table() {
        let t = parse_table_ddl("DEFINE TABLE user SCHEMAFULL PERMISSIONS FULL;").unwrap();
        assert_eq!(t.name, "user");
        assert_eq!(t.permissions, vec![("*".to_string(), "FULL".to_string())]);
    }

    #[test]
    fn parses_relation_with_endpoints() {
        let t = parse_table_ddl("DEFINE TABLE wrote TYPE RELATION IN user OUT post ENFORCED SCHEMAFULL;").unwrap();
        assert!(t.is_relation());
        let edge = t.edge.unwrap();
        assert_eq!(edge.from, "user");
        assert_eq!(edge.to, "post");
        assert_eq!(edge.enforced, Some(true));
    }

    #[test]
    fn parses_changefeed_with_include_original() {
        let t = parse_table_ddl("DEFINE TABLE user SCHEMAFULL CHANGEFEED 7d INCLUDE ORIGINAL;").unwrap();
        let cf = t.change_feed.unwrap();
        assert_eq!(cf.expiry, "7d");
        assert!(cf.include_original);
    }

    #[test]
    fn parses_multi_op_permissions() {
        let pairs = parse_permissions_clause("FOR select, create FULL FOR update, delete NONE");
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "FULL".to_string()),
                ("create".to_string(), "FULL".to_string()),
                ("update".to_string(), "NONE".to_string()),
                ("delete".to_string(), "NONE".to_string()),
            ]
        );
    }
}
