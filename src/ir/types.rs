// src/ir/types.rs

//! Type-expression grammar: primitives, generics, literal
//! unions. Stored as a small recursive-descent-parsed AST rather than a
//! raw string so the differ and normalizer can compare types structurally
//! instead of re-parsing text on every comparison.

use std::fmt;

/// A primitive scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Int,
    Float,
    Decimal,
    Bool,
    Datetime,
    Duration,
    Uuid,
    Bytes,
    Number,
    Null,
    Any,
    Object,
}

impl Primitive {
    fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Decimal => "decimal",
            Primitive::Bool => "bool",
            Primitive::Datetime => "datetime",
            Primitive::Duration => "duration",
            Primitive::Uuid => "uuid",
            Primitive::Bytes => "bytes",
            Primitive::Number => "number",
            Primitive::Null => "null",
            Primitive::Any => "any",
            Primitive::Object => "object",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "string" => Primitive::String,
            "int" => Primitive::Int,
            "float" => Primitive::Float,
            "decimal" => Primitive::Decimal,
            "bool" => Primitive::Bool,
            "datetime" => Primitive::Datetime,
            "duration" => Primitive::Duration,
            "uuid" => Primitive::Uuid,
            "bytes" => Primitive::Bytes,
            "number" => Primitive::Number,
            "null" => Primitive::Null,
            "any" => Primitive::Any,
            "object" => Primitive::Object,
            _ => return None,
        })
    }
}

/// A member of a literal union (`"a" | "b" | 1 | true`).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(String),
    Bool(bool),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            LiteralValue::Int(n) => write!(f, "{n}"),
            LiteralValue::Float(n) => write!(f, "{n}"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A parsed type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(Primitive),
    Geometry(Option<String>),
    Array(Box<TypeExpr>, Option<u32>, Option<u32>),
    Set(Box<TypeExpr>, Option<u32>, Option<u32>),
    Record(Vec<String>),
    Option(Box<TypeExpr>),
    Range(Box<TypeExpr>),
    Literal(Vec<LiteralValue>),
    /// Anything the recursive-descent grammar above does not cover yet
    /// (a newer database type). Preserved verbatim so a round-trip does
    /// not lose information.
    Raw(String),
}

impl TypeExpr {
    /// Parse a type expression. The input is expected to already be
    /// lowercased and whitespace-collapsed (the normalizer's job); this
    /// function does not re-normalize.
    pub fn parse(input: &str) -> TypeExpr {
        let s = input.trim();
        if s.is_empty() {
            return TypeExpr::Raw(String::new());
        }
        // option<T> as written, or legacy `T?` (caller should already have
        // folded `none | T` to `option<T>` via the normalizer, but `T?` is
        // folded here too since it's a pure syntactic rewrite, not a
        // database-specific canonicalization).
        if let Some(inner) = s.strip_suffix('?') {
            return TypeExpr::Option(Box::new(TypeExpr::parse(inner)));
        }
        if contains_top_level(s, '|') {
            return parse_union(s);
        }
        if let Some((head, args)) = split_generic(s) {
            return parse_generic(head, args);
        }
        if let Some(p) = Primitive::parse(s) {
            return TypeExpr::Primitive(p);
        }
        TypeExpr::Raw(s.to_string())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(p) => write!(f, "{}", p.as_str()),
            TypeExpr::Geometry(None) => write!(f, "geometry"),
            TypeExpr::Geometry(Some(sub)) => write!(f, "geometry<{sub}>"),
            TypeExpr::Array(t, None, None) => write!(f, "array<{t}>"),
            TypeExpr::Array(t, Some(min), None) => write!(f, "array<{t}, {min}>"),
            TypeExpr::Array(t, Some(min), Some(max)) => write!(f, "array<{t}, {min}, {max}>"),
            TypeExpr::Array(t, None, Some(max)) => write!(f, "array<{t}, 0, {max}>"),
            TypeExpr::Set(t, None, None) => write!(f, "set<{t}>"),
            TypeExpr::Set(t, Some(min), None) => write!(f, "set<{t}, {min}>"),
            TypeExpr::Set(t, Some(min), Some(max)) => write!(f, "set<{t}, {min}, {max}>"),
            TypeExpr::Set(t, None, Some(max)) => write!(f, "set<{t}, 0, {max}>"),
            TypeExpr::Record(tables) if tables.is_empty() => write!(f, "record"),
            TypeExpr::Record(tables) => write!(f, "record<{}>", tables.join(" | ")),
            TypeExpr::Option(t) => write!(f, "option<{t}>"),
            TypeExpr::Range(t) => write!(f, "range<{t}>"),
            TypeExpr::Literal(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "{}", parts.join(" | "))
            }
            TypeExpr::Raw(s) => write!(f, "{s}"),
        }
    }
}

/// True if `needle` occurs outside any `<...>` nesting or quoted string.
pub(crate) fn contains_top_level(s: &str, needle: char) -> bool {
    let mut depth = 0i32;
    let mut in_quote: Option<char> = None;
    for c in s.chars() {
        match in_quote {
            Some(q) => {
                if c == q {
                    in_quote = None;
                }
            }
            None => match c {
                '\'' | '"' => in_quote = Some(c),
                '<' => depth += 1,
                '>' => depth -= 1,
                _ if c == needle && depth == 0 => return true,
                _ => {}
            },
        }
    }
    false
}

/// Split `s` on top-level `|` respecting `<...>` nesting and quotes.
pub(crate) fn split_top_level(s: &str, needle: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote: Option<char> = None;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match in_quote {
            Some(q) => {
                if c == q {
                    in_quote = None;
                }
            }
            None => match c {
                '\'' | '"' => in_quote = Some(c),
                '<' => depth += 1,
                '>' => depth -= 1,
                _ if c == needle && depth == 0 => {
                    parts.push(s[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn parse_union(s: &str) -> TypeExpr {
    let members = split_top_level(s, '|');
    let literals: Vec<LiteralValue> = members.iter().filter_map(|m| parse_literal(m)).collect();
    if literals.len() == members.len() {
        TypeExpr::Literal(literals)
    } else {
        TypeExpr::Raw(s.to_string())
    }
}

fn parse_literal(s: &str) -> Option<LiteralValue> {
    let s = s.trim();
    if (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
        || (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
    {
        return Some(LiteralValue::Str(s[1..s.len() - 1].to_string()));
    }
    if s == "true" {
        return Some(LiteralValue::Bool(true));
    }
    if s == "false" {
        return Some(LiteralValue::Bool(false));
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(LiteralValue::Int(n));
    }
    if s.parse::<f64>().is_ok() {
        return Some(LiteralValue::Float(s.to_string()));
    }
    None
}

/// Split `head<args>` into (head, args) at the outermost angle brackets.
fn split_generic(s: &str) -> Option<(&str, &str)> {
    let open = s.find('<')?;
    if !s.ends_with('>') {
        return None;
    }
    let head = &s[..open];
    let args = &s[open + 1..s.len() - 1];
    Some((head, args))
}

fn parse_generic(head: &str, args: &str) -> TypeExpr {
    match head {
        "geometry" => TypeExpr::Geometry(Some(args.trim().to_string())),
        "option" => TypeExpr::Option(Box::new(TypeExpr::parse(args))),
        "range" => TypeExpr::Range(Box::new(TypeExpr::parse(args))),
        "record" => {
            let tables = split_top_level(args, '|')
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            TypeExpr::Record(tables)
        }
        "array" | "set" => {
            let parts = split_top_level(args, ',');
            let inner = TypeExpr::parse(parts.first().copied().unwrap_or("any"));
            let min = parts.get(1).and_then(|p| p.trim().parse::<u32>().ok());
            let max = parts.get(2).and_then(|p| p.trim().parse::<u32>().ok());
            if head == "array" {
                TypeExpr::Array(Box::new(inner), min, max)
            } else {
                TypeExpr::Set(Box::new(inner), min, max)
            }
        }
        _ => TypeExpr::Raw(format!("{head}<{args}>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitives() {
        assert_eq!(TypeExpr::parse("string"), TypeExpr::Primitive(Primitive::String));
        assert_eq!(TypeExpr::parse("int"), TypeExpr::Primitive(Primitive::Int));
    }

    #[test]
    fn parses_array_with_bounds() {
        let t = TypeExpr::parse("array<string, 1, 3>");
        assert_eq!(
            t,
            TypeExpr::Array(Box::new(TypeExpr::Primitive(Primitive::String)), Some(1), Some(3))
        );
        assert_eq!(t.to_string(), "array<string, 1, 3>");
    }

    #[test]
    fn option_and_question_mark_agree() {
        assert_eq!(TypeExpr::parse("string?"), TypeExpr::parse("option<string>"));
    }

    #[test]
    fn parses_record_with_multiple_tables() {
        let t = TypeExpr::parse("record<user | org>");
        assert_eq!(t, TypeExpr::Record(vec!["user".into(), "org".into()]));
    }

    #[test]
    fn parses_literal_union_either_quote_style() {
        let single = TypeExpr::parse("'a' | 'b' | 1 | true");
        let double = TypeExpr::parse("\"a\" | \"b\" | 1 | true");
        assert_eq!(single, double);
    }

    #[test]
    fn display_roundtrips_nested_generics() {
        let t = TypeExpr::parse("option<array<record<user>, 0, 5>>");
        assert_eq!(t.to_string(), "option<array<record<user>, 0, 5>>");
    }
}
