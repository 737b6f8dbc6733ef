use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, view::ViewArgs};
use crate::context::Context;
use crate::formatters::OutputFormat;
use crate::repl::Repl;

#[derive(Parser)]
#[command(name = "cornfield")]
#[command(about = "Interroger les access points d'un site cornfield", long_about = None)]
pub struct Cli {
    /// Niveau de verbosité
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Format de sortie (text, json, table)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Mode interactif (REPL)
    #[arg(short, long)]
    pub interactive: bool,

    /// Fichier de configuration JSON décrivant le site
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Commande à exécuter
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interroger un access point
    View {
        access_point: String,
        #[command(flatten)]
        args: ViewArgs,
    },

    /// Lister les items correspondant à une requête
    Search {
        access_point: String,
        /// Prédicat de filtrage
        #[arg(short, long = "where")]
        predicate: Option<String>,
    },

    /// Ouvrir un item à partir de son identité ("1/core")
    Open {
        access_point: String,
        repr: String,
    },

    /// Afficher la chaîne de requête sans l'exécuter
    Explain {
        access_point: String,
        #[command(flatten)]
        args: ViewArgs,
    },

    /// Afficher les propriétés déclarées d'un access point
    Schema {
        access_point: String,
    },

    /// Lister les access points du site
    List,
}

/// Exécute l'application CLI
pub fn run(cli: Cli) -> Result<()> {
    let context = Context::new(cli.config.as_deref(), cli.verbose, cli.format)?;

    if let Some(command) = cli.command {
        commands::execute(&context, command)?;
        if !cli.interactive {
            return Ok(());
        }
    }

    // Sans commande, ou avec -i, on passe en mode interactif
    let mut repl = Repl::new(context)?;
    repl.run()
}
