// src/ir/index.rs

/// Index storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Btree,
    Hash,
    Search,
    Mtree,
    Hnsw,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Btree => "BTREE",
            IndexKind::Hash => "HASH",
            IndexKind::Search => "SEARCH",
            IndexKind::Mtree => "MTREE",
            IndexKind::Hnsw => "HNSW",
        }
    }
}

/// Vector distance metric for `MTREE`/`HNSW` indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
    Manhattan,
    Minkowski,
    Chebyshev,
    Hamming,
    Jaccard,
    Pearson,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "COSINE",
            DistanceMetric::Euclidean => "EUCLIDEAN",
            DistanceMetric::Manhattan => "MANHATTAN",
            DistanceMetric::Minkowski => "MINKOWSKI",
            DistanceMetric::Chebyshev => "CHEBYSHEV",
            DistanceMetric::Hamming => "HAMMING",
            DistanceMetric::Jaccard => "JACCARD",
            DistanceMetric::Pearson => "PEARSON",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_uppercase().as_str() {
            "COSINE" => DistanceMetric::Cosine,
            "EUCLIDEAN" => DistanceMetric::Euclidean,
            "MANHATTAN" => DistanceMetric::Manhattan,
            "MINKOWSKI" => DistanceMetric::Minkowski,
            "CHEBYSHEV" => DistanceMetric::Chebyshev,
            "HAMMING" => DistanceMetric::Hamming,
            "JACCARD" => DistanceMetric::Jaccard,
            "PEARSON" => DistanceMetric::Pearson,
            _ => return None,
        })
    }
}

/// Kind-specific index parameters. Unused fields stay `None` for a given
/// [`IndexKind`]; the differ treats any populated field outside the set
/// relevant to `kind` as a builder mistake, not a database-reported one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexParams {
    // SEARCH
    pub analyzer: Option<String>,
    pub highlights: bool,
    pub bm25: Option<(f64, f64)>,
    pub doc_ids_cache: Option<u32>,
    pub doc_lengths_cache: Option<u32>,
    pub postings_cache: Option<u32>,
    pub terms_cache: Option<u32>,
    // MTREE / HNSW
    pub dimension: Option<u32>,
    pub dist: Option<DistanceMetric>,
    pub capacity: Option<u32>,
    pub efc: Option<u32>,
    pub m: Option<u32>,
    pub m0: Option<u32>,
    pub lm: Option<f64>,
}

/// An index declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub kind: IndexKind,
    pub unique: bool,
    pub concurrently: bool,
    pub if_not_exists: bool,
    pub overwrite: bool,
    pub was: Vec<String>,
    pub comment: Vec<String>,
    pub params: IndexParams,
    /// Set when this index was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Index {
    fn new(name: impl Into<String>) -> Self {
        Index {
            name: name.into(),
            columns: Vec::new(),
            kind: IndexKind::Btree,
            unique: false,
            concurrently: false,
            if_not_exists: false,
            overwrite: false,
            was: Vec::new(),
            comment: Vec::new(),
            params: IndexParams::default(),
            unknown: false,
        }
    }

    /// A placeholder standing in for an index whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        let mut index = Index::new(name);
        index.unknown = true;
        index
    }
}

pub struct IndexBuilder {
    index: Index,
}

impl IndexBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        IndexBuilder { index: Index::new(name) }
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.index.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn unique(mut self) -> Self {
        self.index.unique = true;
        self
    }

    pub fn kind(mut self, kind: IndexKind) -> Self {
        self.index.kind = kind;
        self
    }

    pub fn search(mut self, analyzer: impl Into<String>) -> Self {
        self.index.kind = IndexKind::Search;
        self.index.params.analyzer = Some(analyzer.into());
        self
    }

    pub fn highlights(mut self) -> Self {
        self.index.params.highlights = true;
        self
    }

    pub fn bm25(mut self, k1: f64, b: f64) -> Self {
        self.index.params.bm25 = Some((k1, b));
        self
    }

    pub fn vector(mut self, kind: IndexKind, dimension: u32, dist: DistanceMetric) -> Self {
        self.index.kind = kind;
        self.index.params.dimension = Some(dimension);
        self.index.params.dist = Some(dist);
        self
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.index.params.capacity = Some(capacity);
        self
    }

    pub fn efc(mut self, efc: u32) -> Self {
        self.index.params.efc = Some(efc);
        self
    }

    pub fn m(mut self, m: u32) -> Self {
        self.index.params.m = Some(m);
        self
    }

    pub fn m0(mut self, m0: u32) -> Self {
        self.index.params.m0 = Some(m0);
        self
    }

    pub fn lm(mut self, lm: f64) -> Self {
        self.index.params.lm = Some(lm);
        self
    }

    pub fn concurrently(mut self) -> Self {
        self.index.concurrently = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.index.if_not_exists = true;
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.index.overwrite = true;
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.index.was.push(name.into());
        self
    }

    pub fn comment(mut self, c: impl Into<String>) -> Self {
        self.index.comment.push(c.into());
        self
    }

    pub fn build(self) -> Index {
        self.index
    }
}
