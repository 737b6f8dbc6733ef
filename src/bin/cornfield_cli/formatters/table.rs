use anyhow::Result;
use colored::*;
use prettytable::{Table, Row, Cell};
use cornfield::{Item, PropertyKind, QueryChain, Schema, Value};
use crate::formatters::Formatter;

/// Formateur au format tableau
pub struct TableFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TableFormatter {
    /// Crée un nouveau formateur tableau
    pub fn new() -> Self {
        TableFormatter {
            colored: true,
        }
    }

    /// Désactive les couleurs
    #[cfg(test)]
    pub fn without_colors() -> Self {
        TableFormatter {
            colored: false,
        }
    }
}

/// Texte d'une cellule; les chaînes longues sont tronquées
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > 50 => {
            format!("{}...", s.chars().take(47).collect::<String>())
        }
        Value::String(s) => s.clone(),
        Value::List(_) => "[list]".to_string(),
        Value::Object(_) => "{object}".to_string(),
        other => other.to_string(),
    }
}

/// Colonnes dans l'ordre de première apparition
fn columns(rows: &[Item]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    columns
}

fn header(cells: &[&str]) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}

fn schema_rows(schema: &Schema, prefix: &str, table: &mut Table) {
    for property in schema.properties() {
        let path = format!("{}{}", prefix, property.name);
        table.add_row(Row::new(vec![
            Cell::new(&path),
            Cell::new(&property.kind.to_string()),
            Cell::new(if property.identity { "oui" } else { "" }),
        ]));
        if let PropertyKind::Object(inner) = &property.kind {
            schema_rows(inner, &format!("{}.", path), table);
        }
    }
}

impl Formatter for TableFormatter {
    fn format_rows(&self, rows: &[Item]) -> Result<String> {
        let columns = columns(rows);
        let mut table = Table::new();
        table.add_row(header(&columns));

        for row in rows {
            table.add_row(Row::new(
                columns
                    .iter()
                    .map(|column| Cell::new(&row.get(*column).map(cell_text).unwrap_or_default()))
                    .collect(),
            ));
        }

        Ok(format!("{}{}", table, self.format_info(&format!("{} ligne(s)", rows.len()))))
    }

    fn format_item(&self, item: &Item) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["Propriété", "Type", "Valeur"]));

        for (key, value) in item {
            table.add_row(Row::new(vec![
                Cell::new(key),
                Cell::new(value.type_name()),
                Cell::new(&cell_text(value)),
            ]));
        }

        Ok(table.to_string())
    }

    fn format_chain(&self, chain: &QueryChain) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["#", "Opérateur", "Détail"]));

        for (i, op) in chain.ops().iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&i.to_string()),
                Cell::new(op.name()),
                Cell::new(&serde_json::to_string(op)?),
            ]));
        }

        Ok(table.to_string())
    }

    fn format_schema(&self, schema: &Schema) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["Chemin", "Type", "Identité"]));
        schema_rows(schema, "", &mut table);
        Ok(table.to_string())
    }

    fn format_names(&self, names: &[&str]) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["Index", "Access point"]));

        for (i, name) in names.iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&i.to_string()),
                Cell::new(name),
            ]));
        }

        Ok(table.to_string())
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
