// src/ir/param.rs

/// A database-scoped parameter (referenced as `$name` in DDL/expressions).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: String,
    pub comment: Option<String>,
    pub was: Vec<String>,
    /// Set when this param was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Param {
    /// A placeholder standing in for a param whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix('$').map(str::to_string).unwrap_or(name);
        Param { name, value: String::new(), comment: None, was: Vec::new(), unknown: true }
    }
}

pub struct ParamBuilder {
    param: Param,
}

impl ParamBuilder {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix('$').map(str::to_string).unwrap_or(name);
        ParamBuilder {
            param: Param { name, value: value.into(), comment: None, was: Vec::new(), unknown: false },
        }
    }

    pub fn comment(mut self, c: impl Into<String>) -> Self {
        self.param.comment = Some(c.into());
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.param.was.push(name.into());
        self
    }

    pub fn build(self) -> Param {
        self.param
    }
}
