use anyhow::Result;
use colored::*;
use cornfield::core::item;
use cornfield::{Item, PropertyKind, QueryChain, Schema};
use crate::formatters::Formatter;

/// Formateur au format texte
pub struct TextFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TextFormatter {
    /// Crée un nouveau formateur texte
    pub fn new() -> Self {
        TextFormatter {
            colored: true,
        }
    }

    /// Désactive les couleurs
    #[cfg(test)]
    pub fn without_colors() -> Self {
        TextFormatter {
            colored: false,
        }
    }
}

fn schema_lines(schema: &Schema, indent: usize, lines: &mut Vec<String>) {
    for property in schema.properties() {
        let marker = if property.identity { " (identité)" } else { "" };
        lines.push(format!("{}{}: {}{}", " ".repeat(indent), property.name, property.kind, marker));
        if let PropertyKind::Object(inner) = &property.kind {
            schema_lines(inner, indent + 2, lines);
        }
    }
}

impl Formatter for TextFormatter {
    fn format_rows(&self, rows: &[Item]) -> Result<String> {
        let mut out: Vec<String> = rows.iter().map(|row| item::to_string_pretty(row, 0)).collect();
        out.push(self.format_info(&format!("{} ligne(s)", rows.len())));
        Ok(out.join("\n"))
    }

    fn format_item(&self, item: &Item) -> Result<String> {
        Ok(item::to_string_pretty(item, 0))
    }

    fn format_chain(&self, chain: &QueryChain) -> Result<String> {
        let mut lines = Vec::with_capacity(chain.len());
        for op in chain.ops() {
            let name = if self.colored {
                format!("{:<10}", op.name()).bold().to_string()
            } else {
                format!("{:<10}", op.name())
            };
            lines.push(format!("{} {}", name, serde_json::to_string(op)?));
        }
        Ok(lines.join("\n"))
    }

    fn format_schema(&self, schema: &Schema) -> Result<String> {
        let mut lines = Vec::new();
        schema_lines(schema, 0, &mut lines);
        Ok(lines.join("\n"))
    }

    fn format_names(&self, names: &[&str]) -> Result<String> {
        Ok(names.join("\n"))
    }

    fn format_error(&self, error: &str) -> String {
        if self.colored {
            format!("{}", error.red().bold())
        } else {
            format!("Erreur: {}", error)
        }
    }

    fn format_info(&self, info: &str) -> String {
        if self.colored {
            format!("{}", info.blue())
        } else {
            format!("Info: {}", info)
        }
    }

    fn format_success(&self, success: &str) -> String {
        if self.colored {
            format!("{}", success.green().bold())
        } else {
            format!("Succès: {}", success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cornfield::Property;

    #[test]
    fn test_schema_is_indented() {
        let address = Schema::new()
            .with(Property::new("city", PropertyKind::String)).unwrap();
        let schema = Schema::new()
            .with(Property::new("id", PropertyKind::Integer).identity()).unwrap()
            .with(Property::new("address", PropertyKind::Object(address))).unwrap();
        let text = TextFormatter::without_colors().format_schema(&schema).unwrap();
        assert_eq!(text, "id: integer (identité)\naddress: object\n  city: string");
    }
}
