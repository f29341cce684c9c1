// src/parse/function.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::function::{Function, FunctionBuilder};

use super::util::{scan_braced_block, scan_paren_block};

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+function\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*(fn::[a-zA-Z0-9_:]+)\s*\("#)
        .unwrap()
});
static PERMISSIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)\bpermissions\s+(.+?)(?:\s*;|$)"#).unwrap());

/// Parses a single `DEFINE FUNCTION fn::name($a: type, ...) { ... };`
/// statement as reported by `INFO FOR DB`.
pub fn parse_function_ddl(ddl: &str) -> Option<Function> {
    let caps = NAME.captures(ddl)?;
    let name = caps.get(1)?.as_str().to_string();
    let paren_start = caps.get(0)?.end() - 1;
    let (params_text, after_params) = scan_paren_block(ddl, paren_start)?;

    let mut builder = FunctionBuilder::new(name);
    for param in params_text.split(',') {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        if let Some((pname, ptype)) = param.split_once(':') {
            builder = builder.param(pname.trim().trim_start_matches('$'), ptype.trim());
        }
    }

    let tail = &ddl[after_params..];
    if let Some(brace_rel) = tail.find('{') {
        let between = &tail[..brace_rel];
        if let Some(arrow_pos) = between.find("->") {
            let ret = between[arrow_pos + 2..].trim();
            if !ret.is_empty() {
                builder = builder.returns(ret);
            }
        }
    }

    if let Some((body, after_body)) = scan_braced_block(ddl, after_params) {
        builder = builder.body(body);
        if let Some(caps) = PERMISSIONS.captures(&ddl[after_body..]) {
            builder = builder.permissions(caps.get(1).unwrap().as_str().trim());
        }
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_with_params_and_return() {
        let f = parse_function_ddl(
            "DEFINE FUNCTION fn::greet($name: string) -> string { RETURN 'hi ' + $name; } PERMISSIONS FULL;",
        )
        .unwrap();
        assert_eq!(f.name, "fn::greet");
        assert_eq!(f.params, vec![("name".to_string(), "string".to_string())]);
        assert_eq!(f.returns, Some("string".to_string()));
        assert_eq!(f.body, "RETURN 'hi ' + $name;");
        assert_eq!(f.permissions, Some("FULL".to_string()));
    }

    #[test]
    fn parses_function_with_multiple_params() {
        let f = parse_function_ddl("DEFINE FUNCTION fn::add($a: int, $b: int) { RETURN $a + $b; };").unwrap();
        assert_eq!(f.params, vec![("a".to_string(), "int".to_string()), ("b".to_string(), "int".to_string())]);
    }
}
