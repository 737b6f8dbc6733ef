use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use cornfield::core::item;
use cornfield::{Item, QueryChain, Schema};
use crate::formatters::Formatter;

/// Formateur au format JSON
pub struct JsonFormatter {
    /// Indique si l'indentation est activée
    pretty: bool,
}

impl JsonFormatter {
    /// Crée un nouveau formateur JSON
    pub fn new() -> Self {
        JsonFormatter {
            pretty: true,
        }
    }

    /// Désactive l'indentation
    #[cfg(test)]
    pub fn without_pretty() -> Self {
        JsonFormatter {
            pretty: false,
        }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    fn message(&self, key: &str, text: &str) -> String {
        let mut json_value = serde_json::Map::new();
        json_value.insert(key.to_string(), json!(text));
        self.render(&json_value)
            .unwrap_or_else(|_| format!("{{\"{}\":\"{}\"}}", key, text))
    }
}

impl Formatter for JsonFormatter {
    fn format_rows(&self, rows: &[Item]) -> Result<String> {
        let rows: Vec<serde_json::Value> = rows.iter().map(item::to_json).collect();
        self.render(&rows)
    }

    fn format_item(&self, item: &Item) -> Result<String> {
        self.render(&item::to_json(item))
    }

    fn format_chain(&self, chain: &QueryChain) -> Result<String> {
        self.render(chain)
    }

    fn format_schema(&self, schema: &Schema) -> Result<String> {
        self.render(schema)
    }

    fn format_names(&self, names: &[&str]) -> Result<String> {
        self.render(names)
    }

    fn format_error(&self, error: &str) -> String {
        self.message("error", error)
    }

    fn format_info(&self, info: &str) -> String {
        self.message("info", info)
    }

    fn format_success(&self, success: &str) -> String {
        self.message("success", success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cornfield::Value;

    #[test]
    fn test_rows_are_a_json_array() {
        let mut row = Item::new();
        row.insert("name".to_string(), Value::from("Ada"));
        row.insert("born".to_string(), Value::Integer(1815));
        let out = JsonFormatter::without_pretty().format_rows(&[row]).unwrap();
        assert_eq!(out, r#"[{"born":1815,"name":"Ada"}]"#);
        assert_eq!(JsonFormatter::without_pretty().format_error("boom"), r#"{"error":"boom"}"#);
    }
}
