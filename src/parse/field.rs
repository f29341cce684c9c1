// src/parse/field.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::field::{FieldBuilder, FieldReference, OnDelete};
use crate::ir::types::TypeExpr;
use crate::ir::{Field, Primitive};

use super::util::{clause_value, scan_braced_block, unquote, FLEXIBLE, READONLY};

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+field\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_.\[\]*]+)\s+on\b"#)
        .unwrap()
});
static TYPE_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\btype\s+"#).unwrap());
static DEFAULT_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bdefault\b(\s+always\b)?\s*"#).unwrap());
static VALUE_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bvalue\s+"#).unwrap());
static ASSERT_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bassert\s+"#).unwrap());
static PERMISSIONS_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bpermissions\s+"#).unwrap());
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bcomment\s+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#).unwrap());
static ON_DELETE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\breference\b.*?\bon\s+delete\s+(cascade|set\s+null|set\s+default|restrict)"#).unwrap());

const STOP_WORDS: &[&str] =
    &["readonly", "default", "value", "assert", "permissions", "comment", "reference", "flexible"];

/// Parses a single `DEFINE FIELD ...;` statement as reported by
/// `INFO FOR TABLE <t>`.
pub fn parse_field_ddl(ddl: &str) -> Option<Field> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let mut builder = FieldBuilder::new(name);

    if let Some(m) = TYPE_KW.find(ddl) {
        let type_text = clause_value(ddl, m.end(), STOP_WORDS);
        if !type_text.is_empty() {
            builder = builder.type_of(type_text);
        }
    }

    if READONLY.is_match(ddl) {
        builder = builder.readonly();
    }
    if FLEXIBLE.is_match(ddl) {
        builder = builder.flexible();
    }

    if let Some(m) = DEFAULT_KW.find(ddl) {
        let always = m.as_str().to_lowercase().contains("always");
        let default_text = clause_value(ddl, m.end(), STOP_WORDS);
        if !default_text.is_empty() {
            builder = builder.default(default_text);
        }
        if always {
            builder = builder.default_always();
        }
    }

    if let Some(m) = VALUE_KW.find(ddl) {
        if let Some((body, _)) = scan_braced_block(ddl, m.end()) {
            builder = builder.computed(body);
        } else {
            let value_text = clause_value(ddl, m.end(), STOP_WORDS);
            if !value_text.is_empty() {
                builder = builder.value(value_text);
            }
        }
    }

    if let Some(m) = ASSERT_KW.find(ddl) {
        let assert_text = clause_value(ddl, m.end(), STOP_WORDS);
        if !assert_text.is_empty() {
            builder = builder.assert(assert_text);
        }
    }

    if let Some(m) = PERMISSIONS_KW.find(ddl) {
        let perms_text = clause_value(ddl, m.end(), &["comment"]);
        if !perms_text.is_empty() {
            builder = builder.permissions(perms_text);
        }
    }

    if let Some(caps) = COMMENT.captures(ddl) {
        builder = builder.comment(unquote(caps.get(1).unwrap().as_str()));
    }

    let mut field = builder.build();

    if let Some(caps) = ON_DELETE.captures(ddl) {
        let on_delete = OnDelete::parse(caps.get(1).unwrap().as_str());
        let table = match &field.type_expr {
            TypeExpr::Record(tables) => tables.first().cloned().unwrap_or_default(),
            TypeExpr::Option(inner) => match inner.as_ref() {
                TypeExpr::Record(tables) => tables.first().cloned().unwrap_or_default(),
                _ => String::new(),
            },
            _ => String::new(),
        };
        field.references = Some(FieldReference { table, on_delete });
    }

    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_field() {
        let f = parse_field_ddl("DEFINE FIELD email ON TABLE user TYPE string ASSERT $value != NONE PERMISSIONS FULL;").unwrap();
        assert_eq!(f.name, "email");
        assert_eq!(f.type_expr, TypeExpr::Primitive(Primitive::String));
        assert_eq!(f.assert, vec!["$value != NONE".to_string()]);
    }

    #[test]
    fn parses_computed_value() {
        let f = parse_field_ddl("DEFINE FIELD total ON TABLE cart VALUE { a + b } TYPE number;").unwrap();
        assert_eq!(f.computed, Some("{ a + b }".to_string()));
    }

    #[test]
    fn parses_eager_value() {
        let f = parse_field_ddl("DEFINE FIELD slug ON TABLE post VALUE string::slug($value) TYPE string;").unwrap();
        assert_eq!(f.value, Some("string::slug($value)".to_string()));
    }

    #[test]
    fn parses_reference_on_delete() {
        let f = parse_field_ddl(
            "DEFINE FIELD author ON TABLE post TYPE record<user> REFERENCE ON DELETE CASCADE;",
        )
        .unwrap();
        let r = f.references.unwrap();
        assert_eq!(r.table, "user");
        assert_eq!(r.on_delete, Some(OnDelete::Cascade));
    }
}
