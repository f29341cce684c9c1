// src/ir/access_method.rs

/// Authentication method kind (formerly "scope").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethodKind {
    Jwt,
    Record,
    Bearer,
}

impl AccessMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMethodKind::Jwt => "JWT",
            AccessMethodKind::Record => "RECORD",
            AccessMethodKind::Bearer => "BEARER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "JWT" => Some(AccessMethodKind::Jwt),
            "RECORD" => Some(AccessMethodKind::Record),
            "BEARER" => Some(AccessMethodKind::Bearer),
            _ => None,
        }
    }
}

/// A named record/token-based authentication configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessMethod {
    pub name: String,
    pub kind: AccessMethodKind,
    pub session: Option<String>,
    pub token_duration: Option<String>,
    pub signup: Option<String>,
    pub signin: Option<String>,
    pub authenticate: Option<String>,
    pub was: Vec<String>,
    /// Set when this access method was reconstructed from live DDL the
    /// parser couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl AccessMethod {
    /// A placeholder standing in for an access method whose live DDL
    /// couldn't be parsed. Carries only the name recovered from
    /// introspection; `kind` is an arbitrary default since unknown entries
    /// are never inspected beyond their name.
    pub fn unknown(name: impl Into<String>) -> Self {
        AccessMethod {
            name: name.into(),
            kind: AccessMethodKind::Jwt,
            session: None,
            token_duration: None,
            signup: None,
            signin: None,
            authenticate: None,
            was: Vec::new(),
            unknown: true,
        }
    }
}

pub struct AccessMethodBuilder {
    access: AccessMethod,
}

impl AccessMethodBuilder {
    pub fn new(name: impl Into<String>, kind: AccessMethodKind) -> Self {
        AccessMethodBuilder {
            access: AccessMethod {
                name: name.into(),
                kind,
                session: None,
                token_duration: None,
                signup: None,
                signin: None,
                authenticate: None,
                was: Vec::new(),
                unknown: false,
            },
        }
    }

    pub fn session(mut self, duration: impl Into<String>) -> Self {
        self.access.session = Some(duration.into());
        self
    }

    pub fn token_duration(mut self, duration: impl Into<String>) -> Self {
        self.access.token_duration = Some(duration.into());
        self
    }

    pub fn signup(mut self, expr: impl Into<String>) -> Self {
        self.access.signup = Some(expr.into());
        self
    }

    pub fn signin(mut self, expr: impl Into<String>) -> Self {
        self.access.signin = Some(expr.into());
        self
    }

    pub fn authenticate(mut self, expr: impl Into<String>) -> Self {
        self.access.authenticate = Some(expr.into());
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.access.was.push(name.into());
        self
    }

    pub fn build(self) -> AccessMethod {
        self.access
    }
}
