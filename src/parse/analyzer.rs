// src/parse/analyzer.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::analyzer::{Analyzer, AnalyzerBuilder};

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+analyzer\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_]+)"#).unwrap()
});
static TOKENIZERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\btokenizers\s+(.+?)(?:\s+filters\b|\s+function\b|\s*;|$)"#).unwrap());
static FILTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)\bfilters\s+(.+?)(?:\s+function\b|\s*;|$)"#).unwrap());
static FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bfunction\s+(fn::[a-zA-Z0-9_:]+)"#).unwrap());

/// Parses a single `DEFINE ANALYZER ...;` statement as reported by
/// `INFO FOR DB`.
pub fn parse_analyzer_ddl(ddl: &str) -> Option<Analyzer> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let mut builder = AnalyzerBuilder::new(name);

    if let Some(caps) = TOKENIZERS.captures(ddl) {
        let tokenizers: Vec<String> = caps.get(1).unwrap().as_str().split(',').map(|t| t.trim().to_string()).collect();
        builder = builder.tokenizers(tokenizers);
    }
    if let Some(caps) = FILTERS.captures(ddl) {
        let filters: Vec<String> = caps.get(1).unwrap().as_str().split(',').map(|t| t.trim().to_string()).collect();
        builder = builder.filters(filters);
    }
    if let Some(caps) = FUNCTION.captures(ddl) {
        builder = builder.function(caps.get(1).unwrap().as_str());
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyzer_with_tokenizers_and_filters() {
        let a = parse_analyzer_ddl("DEFINE ANALYZER ascii TOKENIZERS class FILTERS lowercase,ascii;").unwrap();
        assert_eq!(a.name, "ascii");
        assert_eq!(a.tokenizers, vec!["class".to_string()]);
        assert_eq!(a.filters, vec!["lowercase".to_string(), "ascii".to_string()]);
    }
}
