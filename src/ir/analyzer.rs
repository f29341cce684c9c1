// src/ir/analyzer.rs

/// A full-text search analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    pub name: String,
    pub tokenizers: Vec<String>,
    pub filters: Vec<String>,
    pub function: Option<String>,
    pub was: Vec<String>,
    /// Set when this analyzer was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Analyzer {
    /// A placeholder standing in for an analyzer whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        Analyzer { name: name.into(), tokenizers: Vec::new(), filters: Vec::new(), function: None, was: Vec::new(), unknown: true }
    }
}

pub struct AnalyzerBuilder {
    analyzer: Analyzer,
}

impl AnalyzerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        AnalyzerBuilder {
            analyzer: Analyzer {
                name: name.into(),
                tokenizers: Vec::new(),
                filters: Vec::new(),
                function: None,
                was: Vec::new(),
                unknown: false,
            },
        }
    }

    pub fn tokenizers(mut self, tokenizers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.analyzer.tokenizers = tokenizers.into_iter().map(Into::into).collect();
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.analyzer.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.analyzer.function = Some(name.into());
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.analyzer.was.push(name.into());
        self
    }

    pub fn build(self) -> Analyzer {
        self.analyzer
    }
}
