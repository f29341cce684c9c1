// src/ir/sequence.rs

/// A monotonic sequence generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub name: String,
    pub start: Option<i64>,
    pub batch: Option<u32>,
    pub timeout: Option<String>,
    pub was: Vec<String>,
    /// Set when this sequence was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Sequence {
    /// A placeholder standing in for a sequence whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        Sequence { name: name.into(), start: None, batch: None, timeout: None, was: Vec::new(), unknown: true }
    }
}

pub struct SequenceBuilder {
    sequence: Sequence,
}

impl SequenceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        SequenceBuilder {
            sequence: Sequence { name: name.into(), start: None, batch: None, timeout: None, was: Vec::new(), unknown: false },
        }
    }

    pub fn start(mut self, start: i64) -> Self {
        self.sequence.start = Some(start);
        self
    }

    pub fn batch(mut self, batch: u32) -> Self {
        self.sequence.batch = Some(batch);
        self
    }

    pub fn timeout(mut self, duration: impl Into<String>) -> Self {
        self.sequence.timeout = Some(duration.into());
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.sequence.was.push(name.into());
        self
    }

    pub fn build(self) -> Sequence {
        self.sequence
    }
}
