// src/parse/util.rs

//! Shared regex probes and the brace-depth scanner used by every
//! introspection extractor.

use once_cell::sync::Lazy;
use regex::Regex;

/// Finds the first `{ ... }` block starting at or after `from`, returning
/// the inner text (without the outer braces) and the byte offset just
/// past the closing brace. Handles nested braces and quoted strings so a
/// `{` inside a string literal doesn't throw off the depth count.
///
/// Also recognizes the legacy `<future> { ... }` wrapper: the leading
/// `<future>` marker, if present immediately before the `{`, is skipped
/// and reported as part of the consumed span.
pub fn scan_braced_block(s: &str, from: usize) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if s[i..].starts_with("<future>") {
        i += "<future>".len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
    }
    if i >= bytes.len() || bytes[i] != b'{' {
        return None;
    }
    let start = i + 1;
    let mut depth = 1i32;
    let mut j = start;
    let mut in_quote: Option<u8> = None;
    while j < bytes.len() {
        let c = bytes[j];
        match in_quote {
            Some(q) => {
                if c == b'\\' {
                    j += 1;
                } else if c == q {
                    in_quote = None;
                }
            }
            None => match c {
                b'\'' | b'"' => in_quote = Some(c),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((s[start..j].trim().to_string(), j + 1));
                    }
                }
                _ => {}
            },
        }
        j += 1;
    }
    None
}

/// Finds a balanced `( ... )` block starting at or after `from` (used for
/// `SIGNUP (...)`, `SIGNIN (...)`, `AUTHENTICATE (...)` clauses).
pub fn scan_paren_block(s: &str, from: usize) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    let mut i = from;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'(' {
        return None;
    }
    let start = i + 1;
    let mut depth = 1i32;
    let mut j = start;
    let mut in_quote: Option<u8> = None;
    while j < bytes.len() {
        let c = bytes[j];
        match in_quote {
            Some(q) => {
                if c == b'\\' {
                    j += 1;
                } else if c == q {
                    in_quote = None;
                }
            }
            None => match c {
                b'\'' | b'"' => in_quote = Some(c),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((s[start..j].trim().to_string(), j + 1));
                    }
                }
                _ => {}
            },
        }
        j += 1;
    }
    None
}

/// Strips a single layer of matching quotes (`'...'` or `"..."`) and
/// unescapes `\\`, `\'` and `\"`. Returns the input unchanged if it isn't
/// quoted.
pub fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let quoted = (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
        || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2);
    if !quoted {
        return raw.to_string();
    }
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub static READONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\breadonly\b"#).unwrap());
pub static FLEXIBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bflexible\b"#).unwrap());

/// Extracts the text up to (but not including) any of a set of
/// clause-introducing keywords, or to the end of the statement/semicolon.
/// Used to bound single-line clause values like `TYPE string` before the
/// next `ASSERT`/`DEFAULT`/... keyword.
pub fn clause_value<'a>(s: &'a str, start: usize, stop_words: &[&str]) -> &'a str {
    let rest = &s[start..];
    let mut end = rest.find(';').unwrap_or(rest.len());
    for word in stop_words {
        let re = Regex::new(&format!(r#"(?i)\b{word}\b"#)).unwrap();
        if let Some(m) = re.find(rest) {
            if m.start() < end {
                end = m.start();
            }
        }
    }
    rest[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_nested_braces() {
        let s = "VALUE { IF $x { RETURN 1; } ELSE { RETURN 2; } } PERMISSIONS FULL";
        let (body, end) = scan_braced_block(s, 6).unwrap();
        assert_eq!(body, "IF $x { RETURN 1; } ELSE { RETURN 2; }");
        assert!(s[end..].trim_start().starts_with("PERMISSIONS"));
    }

    #[test]
    fn scans_legacy_future_wrapper() {
        let s = "VALUE <future> { time::now() }";
        let (body, _) = scan_braced_block(s, 6).unwrap();
        assert_eq!(body, "time::now()");
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let s = "VALUE { \"a{b\" }";
        let (body, _) = scan_braced_block(s, 6).unwrap();
        assert_eq!(body, "\"a{b\"");
    }
}
