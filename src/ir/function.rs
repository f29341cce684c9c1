// src/ir/function.rs

/// A custom function, conventionally named `fn::name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
    pub body: String,
    pub permissions: Option<String>,
    pub was: Vec<String>,
    /// Set when this function was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Function {
    /// A placeholder standing in for a function whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.starts_with("fn::") { name } else { format!("fn::{name}") };
        Function { name, params: Vec::new(), returns: None, body: String::new(), permissions: None, was: Vec::new(), unknown: true }
    }
}

pub struct FunctionBuilder {
    function: Function,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.starts_with("fn::") { name } else { format!("fn::{name}") };
        FunctionBuilder {
            function: Function {
                name,
                params: Vec::new(),
                returns: None,
                body: String::new(),
                permissions: None,
                was: Vec::new(),
                unknown: false,
            },
        }
    }

    pub fn param(mut self, name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        self.function.params.push((name.into(), type_expr.into()));
        self
    }

    pub fn returns(mut self, type_expr: impl Into<String>) -> Self {
        self.function.returns = Some(type_expr.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.function.body = body.into();
        self
    }

    pub fn permissions(mut self, expr: impl Into<String>) -> Self {
        self.function.permissions = Some(expr.into());
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.function.was.push(name.into());
        self
    }

    pub fn build(self) -> Function {
        self.function
    }
}
