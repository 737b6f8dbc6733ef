use anyhow::Result;
use cornfield::{Item, QueryChain, Schema};

/// Trait définissant un formateur de sortie
pub trait Formatter {
    /// Formate des lignes de résultat
    fn format_rows(&self, rows: &[Item]) -> Result<String>;

    /// Formate un item isolé
    fn format_item(&self, item: &Item) -> Result<String>;

    /// Formate une chaîne de requête
    fn format_chain(&self, chain: &QueryChain) -> Result<String>;

    /// Formate les propriétés déclarées d'un access point
    fn format_schema(&self, schema: &Schema) -> Result<String>;

    /// Formate une liste de noms
    fn format_names(&self, names: &[&str]) -> Result<String>;

    /// Formate un message d'erreur
    fn format_error(&self, error: &str) -> String;

    /// Formate un message d'information
    fn format_info(&self, info: &str) -> String;

    /// Formate un message de succès
    fn format_success(&self, success: &str) -> String;
}
