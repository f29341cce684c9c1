// src/parse/param.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::param::{Param, ParamBuilder};

use super::util::unquote;

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+param\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*\$?([a-zA-Z0-9_]+)"#).unwrap()
});
static VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)\bvalue\s+(.+?)(?:\s+comment\b|\s*;|$)"#).unwrap());
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bcomment\s+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#).unwrap());

/// Parses a single `DEFINE PARAM ...;` statement as reported by
/// `INFO FOR DB`.
pub fn parse_param_ddl(ddl: &str) -> Option<Param> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let value = VALUE.captures(ddl)?.get(1)?.as_str().trim().to_string();
    let mut builder = ParamBuilder::new(name, value);

    if let Some(caps) = COMMENT.captures(ddl) {
        builder = builder.comment(unquote(caps.get(1).unwrap().as_str()));
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_param_with_comment() {
        let p = parse_param_ddl("DEFINE PARAM $apiTimeout VALUE 30s COMMENT \"request budget\";").unwrap();
        assert_eq!(p.name, "apiTimeout");
        assert_eq!(p.value, "30s");
        assert_eq!(p.comment, Some("request budget".to_string()));
    }
}
