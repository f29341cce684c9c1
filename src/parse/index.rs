// src/parse/index.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::index::{DistanceMetric, Index, IndexBuilder, IndexKind};

use super::util::unquote;

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+index\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_]+)\s+on\b"#)
        .unwrap()
});
static FIELDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\b(?:fields|columns)\s+(.+?)(?:\s+unique\b|\s+search\b|\s+mtree\b|\s+hnsw\b|\s*;|$)"#).unwrap());
static UNIQUE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bunique\b"#).unwrap());
static CONCURRENTLY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bconcurrently\b"#).unwrap());
static ANALYZER: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\banalyzer\s+([a-zA-Z0-9_]+)"#).unwrap());
static HIGHLIGHTS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bhighlights\b"#).unwrap());
static BM25: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bbm25\s*\(\s*([0-9.]+)\s*,\s*([0-9.]+)\s*\)"#).unwrap());
static DIMENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bdimension\s+(\d+)"#).unwrap());
static DIST: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bdist\s+([a-z]+)"#).unwrap());
static CAPACITY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bcapacity\s+(\d+)"#).unwrap());
static EFC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\befc\s+(\d+)"#).unwrap());
static M0: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bm0\s+(\d+)"#).unwrap());
static M: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bm\s+(\d+)"#).unwrap());
static LM: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\blm\s+([0-9.]+)"#).unwrap());
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bcomment\s+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#).unwrap());

/// Parses a single `DEFINE INDEX ...;` statement as reported by
/// `INFO FOR TABLE <t>`.
pub fn parse_index_ddl(ddl: &str) -> Option<Index> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let mut builder = IndexBuilder::new(name);

    if let Some(caps) = FIELDS.captures(ddl) {
        let cols: Vec<String> = caps.get(1).unwrap().as_str().split(',').map(|c| c.trim().to_string()).collect();
        builder = builder.columns(cols);
    }

    if UNIQUE.is_match(ddl) {
        builder = builder.unique();
    }
    if CONCURRENTLY.is_match(ddl) {
        builder = builder.concurrently();
    }

    if let Some(caps) = ANALYZER.captures(ddl) {
        builder = builder.search(caps.get(1).unwrap().as_str());
        if HIGHLIGHTS.is_match(ddl) {
            builder = builder.highlights();
        }
        if let Some(caps) = BM25.captures(ddl) {
            let k1: f64 = caps.get(1).unwrap().as_str().parse().unwrap_or(1.2);
            let b: f64 = caps.get(2).unwrap().as_str().parse().unwrap_or(0.75);
            builder = builder.bm25(k1, b);
        }
    } else if ddl.to_uppercase().contains("MTREE") || ddl.to_uppercase().contains("HNSW") {
        let kind = if ddl.to_uppercase().contains("HNSW") { IndexKind::Hnsw } else { IndexKind::Mtree };
        let dimension: u32 = DIMENSION.captures(ddl).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let dist = DIST
            .captures(ddl)
            .and_then(|c| c.get(1))
            .and_then(|m| DistanceMetric::parse(m.as_str()))
            .unwrap_or(DistanceMetric::Euclidean);
        builder = builder.vector(kind, dimension, dist);
        if let Some(m) = CAPACITY.captures(ddl).and_then(|c| c.get(1)) {
            builder = builder.capacity(m.as_str().parse().unwrap_or(0));
        }
        if let Some(m) = EFC.captures(ddl).and_then(|c| c.get(1)) {
            builder = builder.efc(m.as_str().parse().unwrap_or(0));
        }
        if let Some(m) = M0.captures(ddl).and_then(|c| c.get(1)) {
            builder = builder.m0(m.as_str().parse().unwrap_or(0));
        }
        if let Some(m) = M.captures(ddl).and_then(|c| c.get(1)) {
            builder = builder.m(m.as_str().parse().unwrap_or(0));
        }
        if let Some(m) = LM.captures(ddl).and_then(|c| c.get(1)) {
            builder = builder.lm(m.as_str().parse().unwrap_or(0.0));
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
    fn parses_unique_index() {
        let i = parse_index_ddl("DEFINE INDEX email ON TABLE user FIELDS email UNIQUE;").unwrap();
        assert_eq!(i.columns, vec!["email".to_string()]);
        assert!(i.unique);
    }

    #[test]
    fn parses_search_index() {
        let i = parse_index_ddl(
            "DEFINE INDEX body_ix ON TABLE post FIELDS body SEARCH ANALYZER ascii BM25(1.2,0.75) HIGHLIGHTS;",
        )
        .unwrap();
        assert_eq!(i.kind, IndexKind::Search);
        assert_eq!(i.params.analyzer, Some("ascii".to_string()));
        assert!(i.params.highlights);
        assert_eq!(i.params.bm25, Some((1.2, 0.75)));
    }

    #[test]
    fn parses_mtree_index() {
        let i = parse_index_ddl(
            "DEFINE INDEX embedding_ix ON TABLE doc FIELDS embedding MTREE DIMENSION 384 DIST COSINE CAPACITY 40;",
        )
        .unwrap();
        assert_eq!(i.kind, IndexKind::Mtree);
        assert_eq!(i.params.dimension, Some(384));
        assert_eq!(i.params.dist, Some(DistanceMetric::Cosine));
        assert_eq!(i.params.capacity, Some(40));
    }
}
