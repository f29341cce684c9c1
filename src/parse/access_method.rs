// src/parse/access_method.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::access_method::{AccessMethod, AccessMethodBuilder, AccessMethodKind};

use super::util::scan_paren_block;

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+access\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_]+)"#).unwrap()
});
static KIND: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\btype\s+(jwt|record|bearer)\b"#).unwrap());
static SESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bfor\s+session\s+(\S+)"#).unwrap());
static TOKEN_DURATION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bfor\s+token\s+(\S+)"#).unwrap());
static SIGNUP_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bsignup\s*"#).unwrap());
static SIGNIN_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bsignin\s*"#).unwrap());
static AUTHENTICATE_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bauthenticate\s*"#).unwrap());

/// Parses a single `DEFINE ACCESS ...;` statement as reported by
/// `INFO FOR DB`.
pub fn parse_access_ddl(ddl: &str) -> Option<AccessMethod> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();
    let kind = KIND
        .captures(ddl)
        .and_then(|c| c.get(1))
        .and_then(|m| AccessMethodKind::parse(m.as_str()))
        .unwrap_or(AccessMethodKind::Record);

    let mut builder = AccessMethodBuilder::new(name, kind);

    if let Some(caps) = SESSION.captures(ddl) {
        builder = builder.session(caps.get(1).unwrap().as_str().trim_end_matches([',', ';']));
    }
    if let Some(caps) = TOKEN_DURATION.captures(ddl) {
        builder = builder.token_duration(caps.get(1).unwrap().as_str().trim_end_matches([',', ';']));
    }

    if let Some(m) = SIGNUP_KW.find(ddl) {
        if let Some((expr, _)) = scan_paren_block(ddl, m.end()) {
            builder = builder.signup(expr);
        }
    }
    if let Some(m) = SIGNIN_KW.find(ddl) {
        if let Some((expr, _)) = scan_paren_block(ddl, m.end()) {
            builder = builder.signin(expr);
        }
    }
    if let Some(m) = AUTHENTICATE_KW.find(ddl) {
        if let Some((expr, _)) = scan_paren_block(ddl, m.end()) {
            builder = builder.authenticate(expr);
        }
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_access_with_signup_signin() {
        let a = parse_access_ddl(
            "DEFINE ACCESS user_access ON DATABASE TYPE RECORD \
             SIGNUP (CREATE user SET email = $email) \
             SIGNIN (SELECT * FROM user WHERE email = $email) \
             DURATION FOR TOKEN 15m, FOR SESSION 12h;",
        )
        .unwrap();
        assert_eq!(a.kind, AccessMethodKind::Record);
        assert_eq!(a.signup, Some("CREATE user SET email = $email".to_string()));
        assert_eq!(a.signin, Some("SELECT * FROM user WHERE email = $email".to_string()));
        assert_eq!(a.token_duration, Some("15m".to_string()));
        assert_eq!(a.session, Some("12h".to_string()));
    }
}
