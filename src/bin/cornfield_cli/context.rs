use std::path::Path;
use anyhow::{Context as _, Result};
use log::info;
use cornfield::{Site, SiteConfig};

use crate::formatters::{self, Formatter, OutputFormat};

/// Contexte d'exécution du CLI
pub struct Context {
    /// Site chargé depuis la configuration
    site: Site,

    /// Format de sortie
    format: OutputFormat,

    /// Niveau de verbosité
    verbosity: u8,

    /// Formateur actuel
    formatter: Box<dyn Formatter>,
}

impl Context {
    /// Crée un nouveau contexte, avec un site vide si aucune configuration n'est donnée
    pub fn new(config: Option<&Path>, verbosity: u8, format: OutputFormat) -> Result<Self> {
        let site = match config {
            Some(path) => {
                let config = SiteConfig::from_path(path)
                    .with_context(|| format!("Impossible de lire {}", path.display()))?;
                let site = config.build()?;
                info!("Site chargé depuis {}", path.display());
                site
            }
            None => Site::new(),
        };

        Ok(Context {
            site,
            format,
            verbosity,
            formatter: formatters::create(format),
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Obtient le formateur actuel
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Définit le format de sortie
    pub fn set_format(&mut self, format: OutputFormat) {
        if format != self.format {
            self.format = format;
            self.formatter = formatters::create(format);
        }
    }

    /// Obtient le niveau de verbosité
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}
