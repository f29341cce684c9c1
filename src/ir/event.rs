// src/ir/event.rs

/// Event trigger type, inferred by the parser from the `WHEN` clause when
/// reconstructed from live DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    Create,
    Update,
    Delete,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Create => "CREATE",
            TriggerType::Update => "UPDATE",
            TriggerType::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CREATE" => Some(TriggerType::Create),
            "UPDATE" => Some(TriggerType::Update),
            "DELETE" => Some(TriggerType::Delete),
            _ => None,
        }
    }
}

/// A table-level event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub trigger: TriggerType,
    pub when: Option<String>,
    pub then: String,
    /// Set when this event was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Event {
    /// A placeholder standing in for an event whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        Event { name: name.into(), trigger: TriggerType::Create, when: None, then: String::new(), unknown: true }
    }
}

pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    pub fn new(name: impl Into<String>, trigger: TriggerType) -> Self {
        EventBuilder {
            event: Event { name: name.into(), trigger, when: None, then: String::new(), unknown: false },
        }
    }

    pub fn when(mut self, cond: impl Into<String>) -> Self {
        self.event.when = Some(cond.into());
        self
    }

    pub fn then(mut self, body: impl Into<String>) -> Self {
        self.event.then = body.into();
        self
    }

    pub fn build(self) -> Event {
        self.event
    }
}
