// src/mermaid.rs

//! `smig mermaid`: a small Mermaid `erDiagram` renderer over
//! the IR. Deliberately minimal — entities plus the relationships the IR
//! already makes explicit (graph-edge relations and `record<>`/
//! `.references()` fields), not a general diagramming engine.

use std::path::Path;

use crate::error::Result;
use crate::ir::{Schema, TypeExpr};

/// Renders `schema` as a Mermaid `erDiagram` document.
pub fn render(schema: &Schema) -> String {
    let mut out = String::from("erDiagram\n");

    for (name, table) in schema.tables.iter().chain(schema.relations.iter()) {
        out.push_str(&format!("    {} {{\n", sanitize(name)));
        for field in &table.fields {
            out.push_str(&format!("        {} {}\n", sanitize(&mermaid_type(&field.type_expr)), sanitize(&field.name)));
        }
        out.push_str("    }\n");
    }

    let mut relationships: Vec<String> = Vec::new();

    for (name, table) in &schema.relations {
        if let Some(edge) = &table.edge {
            relationships.push(format!("    {} ||--o{{ {} : {}", sanitize(&edge.from), sanitize(&edge.to), sanitize(name)));
        }
    }

    for (name, table) in schema.tables.iter().chain(schema.relations.iter()) {
        for field in &table.fields {
            if let Some(reference) = &field.references {
                relationships.push(format!(
                    "    {} }}o--|| {} : {}",
                    sanitize(name),
                    sanitize(&reference.table),
                    sanitize(&field.name)
                ));
            } else if let TypeExpr::Record(targets) = &field.type_expr {
                for target in targets {
                    relationships.push(format!(
                        "    {} }}o--|| {} : {}",
                        sanitize(name),
                        sanitize(target),
                        sanitize(&field.name)
                    ));
                }
            }
        }
    }

    relationships.sort();
    relationships.dedup();
    for line in relationships {
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// Writes the rendered diagram to `path` (`mermaid -o <path>`).
pub fn render_to_file(schema: &Schema, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, render(schema))?;
    Ok(())
}

/// A short, attribute-friendly rendering of a type expression: generics
/// collapse to their head type, since Mermaid's ER attribute column
/// expects a single token rather than `record<a | b>`-style syntax.
fn mermaid_type(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::Record(_) => "record".to_string(),
        TypeExpr::Option(inner) => format!("option_{}", mermaid_type(inner)),
        TypeExpr::Array(inner, ..) => format!("array_{}", mermaid_type(inner)),
        TypeExpr::Set(inner, ..) => format!("set_{}", mermaid_type(inner)),
        other => other.to_string(),
    }
}

/// Mermaid entity/field/relationship names must be alnum-or-underscore;
/// anything else is folded to `_` rather than rejected outright.
fn sanitize(name: &str) -> String {
    name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{OnDelete, Schema};

    #[test]
    fn renders_entities_and_field_references() {
        let schema = Schema::builder()
            .table("user", |t| t.field("email", |f| f.type_of("string")))
            .table("post", |t| {
                t.field("title", |f| f.type_of("string"))
                    .field("author", |f| f.type_of("record<user>").references("user", Some(OnDelete::Cascade)))
            })
            .build()
            .unwrap();

        let diagram = render(&schema);
        assert!(diagram.starts_with("erDiagram\n"));
        assert!(diagram.contains("user {"));
        assert!(diagram.contains("post {"));
        assert!(diagram.contains("post }o--|| user : author"));
    }

    #[test]
    fn renders_graph_edge_relations() {
        let schema = Schema::builder()
            .table("user", |t| t)
            .table("post", |t| t)
            .relation("wrote", |t| t.edge("user", "post", None))
            .build()
            .unwrap();

        let diagram = render(&schema);
        assert!(diagram.contains("user ||--o{ post : wrote"));
    }
}
