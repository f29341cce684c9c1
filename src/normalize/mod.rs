// src/normalize/mod.rs

//! Canonicalizes any IR so two IRs that denote the same database state
//! compare equal. The database rewrites DDL strings it accepts
//! into a canonical form; the five pure functions below are applied to
//! both the parsed-live IR and the desired IR before the differ compares
//! them. Every function is idempotent — `norm(norm(x)) == norm(x)` — which
//! is a required test property.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::types::{contains_top_level, split_top_level};
use crate::ir::{Analyzer, Field, Function, Param, Schema, Sequence, Table, TypeExpr};

/// Lowercase, whitespace-collapsed. `X?` -> `option<X>`. `none | T` ->
/// `option<T>`. Preserves nested generics and union members.
pub fn norm_type(t: &str) -> String {
    let collapsed = collapse_whitespace(&t.to_lowercase());
    let collapsed = collapsed.trim();

    if let Some(inner) = collapsed.strip_suffix('?') {
        return format!("option<{}>", norm_type(inner));
    }

    if contains_top_level(collapsed, '|') {
        let members = split_top_level(collapsed, '|');
        if members.iter().any(|m| m.trim() == "none") {
            let rest: Vec<&str> = members.into_iter().filter(|m| m.trim() != "none").collect();
            return match rest.len() {
                0 => "none".to_string(),
                1 => format!("option<{}>", norm_type(rest[0])),
                _ => format!("option<{}>", rest.join(" | ")),
            };
        }
    }

    collapsed.to_string()
}

/// Normalizes a [`TypeExpr`] by round-tripping its textual form through
/// [`norm_type`] and re-parsing, folding `X?`/`none | T` into `option<X>`
/// regardless of which form the builder or the parser produced.
pub fn norm_type_expr(t: &TypeExpr) -> TypeExpr {
    TypeExpr::parse(&norm_type(&t.to_string()))
}

/// Strips outer quotes; rewrites embedded double-quoted strings to
/// single-quoted; strips a trailing `f` from numeric float literals;
/// JSON-serializes arrays/objects with deterministic (sorted) key order.
pub fn norm_default(v: &str) -> String {
    let v = v.trim();

    if (v.starts_with('[') && v.ends_with(']')) || (v.starts_with('{') && v.ends_with('}')) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(v) {
            // serde_json's default `Map` is a `BTreeMap`, so this already
            // serializes with stable (alphabetic) key order.
            return serde_json::to_string(&value).unwrap_or_else(|_| v.to_string());
        }
    }

    static FLOAT_F: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^-?\d+\.\d+f$"#).unwrap());
    let unquoted = strip_outer_quotes(v);
    if FLOAT_F.is_match(unquoted) {
        return unquoted.trim_end_matches('f').to_string();
    }

    requote_double_to_single(unquoted)
}

/// Collapses whitespace; unwraps one level of parentheses around simple
/// binary comparisons; folds `\dw` durations to days (×7); rewrites array
/// quote styles; removes `RETURN (SELECT …)` parentheses; strips trailing
/// semicolons before `}`.
pub fn norm_expr(e: &str) -> String {
    let mut s = collapse_whitespace(e).trim().to_string();

    s = fold_week_durations(&s);
    s = requote_double_to_single(&s);
    s = unwrap_return_select_parens(&s);
    s = strip_semicolons_before_brace(&s);
    s = unwrap_simple_comparison_parens(&s);

    s
}

/// Empty/`NONE` -> `FULL`. Removes the deprecated `DELETE` clause. Inserts
/// commas between consecutive `FOR …` clauses. Uppercases keywords.
pub fn norm_perms(p: &str) -> String {
    let trimmed = collapse_whitespace(p);
    let trimmed = trimmed.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return "FULL".to_string();
    }
    if trimmed.eq_ignore_ascii_case("full") {
        return "FULL".to_string();
    }

    static DELETE_CLAUSE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i),?\s*for\s+delete\s+[^,]*"#).unwrap());
    let without_delete = DELETE_CLAUSE.replace_all(trimmed, "");

    static FOR_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bfor\b"#).unwrap());
    let spaced = FOR_CLAUSE.replace_all(&without_delete, ", FOR");
    let spaced = spaced.trim_start_matches(',').trim_start_matches(' ').trim();
    let spaced = spaced.replace(",,", ",");

    static KEYWORDS: &[&str] = &["for", "select", "create", "update", "delete", "full", "none", "where"];
    let mut out = spaced.clone();
    for kw in KEYWORDS {
        let re = Regex::new(&format!(r#"(?i)\b{kw}\b"#)).unwrap();
        let upper = kw.to_uppercase();
        out = re.replace_all(&out, upper.as_str()).to_string();
    }
    out.trim_matches(|c: char| c == ',' || c.is_whitespace()).to_string()
}

/// `null`/`"null"`/`"undefined"` all coalesce to the null sentinel
/// (`None`); otherwise the raw string is preserved.
pub fn norm_comment(c: Option<&str>) -> Option<String> {
    match c {
        None => None,
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("undefined")
            {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\s+"#).unwrap());
    WS.replace_all(s.trim(), " ").to_string()
}

fn strip_outer_quotes(s: &str) -> &str {
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'') || (bytes[0] == b'"' && bytes[s.len() - 1] == b'"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Rewrites `"..."` substrings to `'...'`, leaving already single-quoted
/// text untouched.
fn requote_double_to_single(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();
    let mut in_single = false;
    while let Some((_, c)) = chars.next() {
        if c == '\'' && !in_single {
            in_single = true;
            out.push(c);
            continue;
        }
        if c == '\'' && in_single {
            in_single = false;
            out.push(c);
            continue;
        }
        if c == '"' && !in_single {
            out.push('\'');
            while let Some(&(_, next)) = chars.peek() {
                chars.next();
                if next == '"' {
                    break;
                }
                if next == '\'' {
                    out.push('\\');
                }
                out.push(next);
            }
            out.push('\'');
            continue;
        }
        out.push(c);
    }
    out
}

fn fold_week_durations(s: &str) -> String {
    static WEEKS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\d+)w\b"#).unwrap());
    WEEKS
        .replace_all(s, |caps: &regex::Captures| {
            let weeks: u64 = caps[1].parse().unwrap_or(0);
            format!("{}d", weeks * 7)
        })
        .to_string()
}

fn unwrap_return_select_parens(s: &str) -> String {
    static RETURN_SELECT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)return\s*\(\s*(select\b.*?)\)\s*;?$"#).unwrap());
    if let Some(caps) = RETURN_SELECT.captures(s) {
        return format!("RETURN {}", &caps[1]);
    }
    s.to_string()
}

fn strip_semicolons_before_brace(s: &str) -> String {
    static SEMI_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r#";\s*}"#).unwrap());
    SEMI_BRACE.replace_all(s, "}").to_string()
}

/// Unwraps one level of parentheses around a simple binary comparison,
/// e.g. `($value != NONE)` -> `$value != NONE`. Multi-statement blocks and
/// expressions with a top-level boolean connective are left alone.
fn unwrap_simple_comparison_parens(s: &str) -> String {
    let trimmed = s.trim();
    if !(trimmed.starts_with('(') && trimmed.ends_with(')')) {
        return trimmed.to_string();
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    if balanced_parens(inner) && !contains_top_level(inner, '|') && !inner.contains(" AND ") && !inner.contains(" OR ")
    {
        inner.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn balanced_parens(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Applies the five normalizations recursively across an entire [`Schema`],
/// producing a canonical copy suitable for [`PartialEq`] comparison by the
/// differ.
pub fn normalize_schema(schema: &Schema) -> Schema {
    let mut out = schema.clone();

    for table in out.tables.values_mut().chain(out.relations.values_mut()) {
        normalize_table(table);
    }
    for function in out.functions.values_mut() {
        normalize_function(function);
    }
    for analyzer in out.analyzers.values_mut() {
        normalize_analyzer(analyzer);
    }
    for param in out.params.values_mut() {
        normalize_param(param);
    }
    for sequence in out.sequences.values_mut() {
        normalize_sequence(sequence);
    }
    out
}

fn normalize_table(table: &mut Table) {
    if let Some(cf) = &mut table.change_feed {
        cf.expiry = norm_expr(&cf.expiry);
    }
    for (_, expr) in table.permissions.iter_mut() {
        *expr = norm_perms(expr);
    }
    table.comment = table.comment.iter().filter_map(|c| norm_comment(Some(c))).collect();
    for field in table.fields.iter_mut() {
        normalize_field(field);
    }
    for index in table.indexes.iter_mut() {
        index.comment = index.comment.iter().filter_map(|c| norm_comment(Some(c))).collect();
    }
    for event in table.events.iter_mut() {
        if let Some(when) = &mut event.when {
            *when = norm_expr(when);
        }
        event.then = norm_expr(&event.then);
    }
}

fn normalize_field(field: &mut Field) {
    field.type_expr = norm_type_expr(&field.type_expr);
    if let Some(default) = &mut field.default {
        *default = norm_default(default);
    }
    if let Some(value) = &mut field.value {
        *value = norm_expr(value);
    }
    if let Some(computed) = &mut field.computed {
        *computed = norm_expr(computed);
    }
    for assert in field.assert.iter_mut() {
        *assert = norm_expr(assert);
    }
    field.permissions = norm_perms(&field.permissions);
    field.comment = field.comment.iter().filter_map(|c| norm_comment(Some(c))).collect();
}

fn normalize_function(function: &mut Function) {
    function.body = norm_expr(&function.body);
    if let Some(perms) = &mut function.permissions {
        *perms = norm_perms(perms);
    }
}

fn normalize_analyzer(analyzer: &mut Analyzer) {
    analyzer.tokenizers = analyzer.tokenizers.iter().map(|t| t.to_uppercase()).collect();
    analyzer.filters = analyzer.filters.iter().map(|f| f.to_uppercase()).collect();
}

fn normalize_param(param: &mut Param) {
    param.value = norm_expr(&param.value);
    param.comment = norm_comment(param.comment.as_deref());
}

fn normalize_sequence(sequence: &mut Sequence) {
    if let Some(timeout) = &mut sequence.timeout {
        *timeout = norm_expr(timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idempotent(f: impl Fn(&str) -> String, inputs: &[&str]) {
        for input in inputs {
            let once = f(input);
            let twice = f(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}: {once:?} vs {twice:?}");
        }
    }

    #[test]
    fn norm_type_is_idempotent() {
        idempotent(norm_type, &["STRING", "  int  ", "string?", "none | string", "array<record<user | org>>"]);
    }

    #[test]
    fn norm_default_is_idempotent() {
        idempotent(norm_default, &["\"3.14f\"", "'hello \"world\"'", "[1, 2, 3]", "{\"b\":1,\"a\":2}"]);
    }

    #[test]
    fn norm_expr_is_idempotent() {
        idempotent(norm_expr, &["($value != NONE)", "1w", "RETURN (SELECT * FROM user);", "{ a + b; }"]);
    }

    #[test]
    fn norm_perms_is_idempotent() {
        idempotent(norm_perms, &["", "NONE", "for select full for delete none", "FOR select FULL"]);
    }

    #[test]
    fn norm_comment_is_idempotent() {
        for input in [None, Some("null"), Some("undefined"), Some("a real comment")] {
            let once = norm_comment(input);
            let twice = norm_comment(once.as_deref());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn float_default_roundtrips() {
        assert_eq!(norm_default("\"3.14f\""), "3.14");
        assert_eq!(norm_default("3.14"), "3.14");
    }

    #[test]
    fn option_and_none_union_normalize_identically() {
        assert_eq!(norm_type("string?"), norm_type("none | string"));
        assert_eq!(norm_type("option<string>"), norm_type("none | string"));
    }

    #[test]
    fn durations_one_week_equals_seven_days() {
        assert_eq!(norm_expr("1w"), norm_expr("7d"));
    }

    #[test]
    fn permissions_full_none_and_empty_all_collapse() {
        assert_eq!(norm_perms(""), "FULL");
        assert_eq!(norm_perms("NONE"), "FULL");
        assert_eq!(norm_perms("FULL"), "FULL");
    }

    #[test]
    fn comment_null_sentinels_coalesce() {
        assert_eq!(norm_comment(Some("null")), None);
        assert_eq!(norm_comment(Some("undefined")), None);
        assert_eq!(norm_comment(None), None);
        assert_eq!(norm_comment(Some("keep me")), Some("keep me".to_string()));
    }
}
