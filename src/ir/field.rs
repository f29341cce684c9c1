// src/ir/field.rs

use super::types::TypeExpr;

/// What happens to dependent rows when the referenced record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl OnDelete {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::SetDefault => "SET DEFAULT",
            OnDelete::Restrict => "RESTRICT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CASCADE" => Some(OnDelete::Cascade),
            "SET NULL" => Some(OnDelete::SetNull),
            "SET DEFAULT" => Some(OnDelete::SetDefault),
            "RESTRICT" => Some(OnDelete::Restrict),
            _ => None,
        }
    }
}

/// A `REFERENCES <table> [ON DELETE ...]` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReference {
    pub table: String,
    pub on_delete: Option<OnDelete>,
}

/// A field declaration within a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub type_expr: TypeExpr,
    pub optional: bool,
    pub readonly: bool,
    pub flexible: bool,
    pub if_not_exists: bool,
    pub overwrite: bool,
    pub default_always: bool,
    /// Literal or DDL-expression default, stored as authored DDL text.
    pub default: Option<String>,
    /// DDL expression recomputed on every write.
    pub value: Option<String>,
    /// DDL expression computed on read, stored already wrapped as `{ expr }`.
    pub computed: Option<String>,
    /// Ordered list of assert conditions, ANDed together on emission.
    pub assert: Vec<String>,
    pub permissions: String,
    pub comment: Vec<String>,
    pub references: Option<FieldReference>,
    pub was: Vec<String>,
    /// Set when this field was reconstructed from live DDL the parser
    /// couldn't make sense of; compared by name only.
    pub unknown: bool,
}

impl Field {
    fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            type_expr: TypeExpr::Raw(String::new()),
            optional: false,
            readonly: false,
            flexible: false,
            if_not_exists: false,
            overwrite: false,
            default_always: false,
            default: None,
            value: None,
            computed: None,
            assert: Vec::new(),
            permissions: "FULL".to_string(),
            comment: Vec::new(),
            references: None,
            was: Vec::new(),
            unknown: false,
        }
    }

    /// A placeholder standing in for a field whose live DDL couldn't be
    /// parsed. Carries only the name recovered from introspection.
    pub fn unknown(name: impl Into<String>) -> Self {
        let mut field = Field::new(name);
        field.unknown = true;
        field
    }

    /// The combined assert expression: `(c1) AND (c2) AND …`
    /// for more than one condition, or the bare condition for exactly one.
    pub fn combined_assert(&self) -> Option<String> {
        match self.assert.len() {
            0 => None,
            1 => Some(self.assert[0].clone()),
            _ => Some(
                self.assert
                    .iter()
                    .map(|c| format!("({c})"))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }
}

/// Fluent builder for [`Field`]. Each modifier mutates the builder and
/// returns it; `build()` yields the immutable snapshot.
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        FieldBuilder { field: Field::new(name) }
    }

    pub fn type_of(mut self, type_expr: impl AsRef<str>) -> Self {
        self.field.type_expr = TypeExpr::parse(type_expr.as_ref());
        self
    }

    pub fn optional(mut self) -> Self {
        self.field.optional = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.field.readonly = true;
        self
    }

    pub fn flexible(mut self) -> Self {
        self.field.flexible = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.field.if_not_exists = true;
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.field.overwrite = true;
        self
    }

    pub fn default_always(mut self) -> Self {
        self.field.default_always = true;
        self
    }

    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.field.default = Some(expr.into());
        self
    }

    pub fn value(mut self, expr: impl Into<String>) -> Self {
        self.field.value = Some(expr.into());
        self
    }

    /// Wraps `expr` as `{ expr }`, marking it deferred-evaluated on read
    /// (only the newer form is emitted; the parser still accepts the
    /// legacy `<future> { expr }` wrapper on input).
    pub fn computed(mut self, expr: impl AsRef<str>) -> Self {
        self.field.computed = Some(format!("{{ {} }}", expr.as_ref().trim()));
        self
    }

    pub fn assert(mut self, cond: impl Into<String>) -> Self {
        self.field.assert.push(cond.into());
        self
    }

    /// Sugar for `assert("$value != NONE")`.
    pub fn required(self) -> Self {
        self.assert("$value != NONE")
    }

    pub fn length(self, min: u64, max: Option<u64>) -> Self {
        match max {
            Some(max) => self
                .assert(format!("string::len($value) >= {min}"))
                .assert(format!("string::len($value) <= {max}")),
            None => self.assert(format!("string::len($value) >= {min}")),
        }
    }

    pub fn range(self, min: impl std::fmt::Display, max: impl std::fmt::Display) -> Self {
        self.assert(format!("$value >= {min}")).assert(format!("$value <= {max}"))
    }

    pub fn min(self, n: impl std::fmt::Display) -> Self {
        self.assert(format!("$value >= {n}"))
    }

    pub fn max(self, n: impl std::fmt::Display) -> Self {
        self.assert(format!("$value <= {n}"))
    }

    pub fn regex(self, re: impl AsRef<str>) -> Self {
        self.assert(format!("string::matches($value, \"{}\")", re.as_ref()))
    }

    pub fn permissions(mut self, expr: impl Into<String>) -> Self {
        self.field.permissions = expr.into();
        self
    }

    pub fn comment(mut self, c: impl Into<String>) -> Self {
        self.field.comment.push(c.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>, on_delete: Option<OnDelete>) -> Self {
        self.field.references = Some(FieldReference { table: table.into(), on_delete });
        self
    }

    pub fn was(mut self, name: impl Into<String>) -> Self {
        self.field.was.push(name.into());
        self
    }

    pub fn was_many(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.field.was.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_is_sugar_for_not_none_assert() {
        let f = FieldBuilder::new("email").type_of("string").required().build();
        assert_eq!(f.assert, vec!["$value != NONE".to_string()]);
    }

    #[test]
    fn combined_assert_joins_with_and() {
        let f = FieldBuilder::new("age").type_of("int").min(0).max(150).build();
        assert_eq!(f.combined_assert().unwrap(), "($value >= 0) AND ($value <= 150)");
    }

    #[test]
    fn single_assert_has_no_parens() {
        let f = FieldBuilder::new("age").type_of("int").min(0).build();
        assert_eq!(f.combined_assert().unwrap(), "$value >= 0");
    }

    #[test]
    fn computed_wraps_in_braces() {
        let f = FieldBuilder::new("total").type_of("number").computed("a + b").build();
        assert_eq!(f.computed, Some("{ a + b }".to_string()));
    }
}
