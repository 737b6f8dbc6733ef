pub mod formatter;
pub mod text;
pub mod json;
pub mod table;

pub use formatter::Formatter;
use clap::ValueEnum;

/// Formats de sortie disponibles
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Format texte
    Text,

    /// Format JSON
    Json,

    /// Format tableau
    Table,
}

/// Crée le formateur correspondant à un format
pub fn create(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(text::TextFormatter::new()),
        OutputFormat::Json => Box::new(json::JsonFormatter::new()),
        OutputFormat::Table => Box::new(table::TableFormatter::new()),
    }
}
