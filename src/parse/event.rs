// src/parse/event.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::event::{Event, EventBuilder, TriggerType};

use super::util::scan_braced_block;

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)^\s*define\s+event\s+(?:(?:if\s+not\s+exists)|(?:overwrite))?\s*([a-zA-Z0-9_]+)\s+on\b"#)
        .unwrap()
});
static WHEN_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bwhen\s+"#).unwrap());
static THEN_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bthen\s+"#).unwrap());

/// Infers the trigger type from the `WHEN` condition's use of `$before`/
/// `$after`: absent-before means a create, absent-after means a delete,
/// both present means an update. Defaults to update when the condition
/// doesn't mention either (the common case for a generic event).
fn infer_trigger(when: &str) -> TriggerType {
    let mentions_before = when.contains("$before");
    let mentions_after = when.contains("$after");
    match (mentions_before, mentions_after) {
        (true, false) => TriggerType::Delete,
        (false, true) => TriggerType::Create,
        _ => TriggerType::Update,
    }
}

/// Parses a single `DEFINE EVENT ...;` statement as reported by
/// `INFO FOR TABLE <t>`.
pub fn parse_event_ddl(ddl: &str) -> Option<Event> {
    let name = NAME.captures(ddl)?.get(1)?.as_str().to_string();

    let when_match = WHEN_KW.find(ddl);
    let when = when_match.map(|m| {
        let rest = &ddl[m.end()..];
        let then_pos = THEN_KW.find(rest).map(|tm| tm.start()).unwrap_or(rest.len());
        rest[..then_pos].trim().to_string()
    });

    let trigger = when.as_deref().map(infer_trigger).unwrap_or(TriggerType::Update);
    let mut builder = EventBuilder::new(name, trigger);
    if let Some(w) = &when {
        if !w.is_empty() {
            builder = builder.when(w.clone());
        }
    }

    if let Some(m) = THEN_KW.find(ddl) {
        let then_body = if let Some((body, _)) = scan_braced_block(ddl, m.end()) {
            body
        } else {
            ddl[m.end()..].trim().trim_end_matches(';').trim().to_string()
        };
        builder = builder.then(then_body);
    }

    Some(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_with_braced_then() {
        let e = parse_event_ddl(
            "DEFINE EVENT notify_update ON TABLE post WHEN $before.title != $after.title THEN { CREATE log SET post = $after.id; };",
        )
        .unwrap();
        assert_eq!(e.name, "notify_update");
        assert_eq!(e.trigger, TriggerType::Update);
        assert_eq!(e.then, "CREATE log SET post = $after.id;");
    }

    #[test]
    fn infers_create_trigger_from_missing_before() {
        let e = parse_event_ddl("DEFINE EVENT seed ON TABLE post WHEN $after.title THEN { RETURN NONE; };").unwrap();
        assert_eq!(e.trigger, TriggerType::Create);
    }
}
