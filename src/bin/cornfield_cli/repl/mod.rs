mod history;

use anyhow::{anyhow, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use crate::app::Commands;
use crate::commands;
use crate::context::Context;
use crate::formatters::OutputFormat;
use self::history::History;

/// Une ligne du REPL, analysée avec les mêmes sous-commandes que le CLI
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ReplLine {
    #[command(subcommand)]
    command: Commands,
}

/// Résultat du traitement d'une ligne
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Mode interactif (REPL)
pub struct Repl {
    /// Contexte d'exécution
    context: Context,

    /// Éditeur de ligne
    editor: DefaultEditor,

    /// Historique persistant
    history: History,
}

impl Repl {
    /// Crée un nouveau REPL
    pub fn new(context: Context) -> Result<Self> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| anyhow!("Impossible de créer l'éditeur: {}", e))?;

        let mut history = History::new(History::default_path(), 1000);

        // Charger l'historique s'il existe
        if let Err(e) = history.load() {
            log::warn!("Historique illisible: {}", e);
        }
        for cmd in history.get_all() {
            let _ = editor.add_history_entry(cmd.as_str());
        }

        Ok(Repl {
            context,
            editor,
            history,
        })
    }

    /// Exécute le REPL
    pub fn run(&mut self) -> Result<()> {
        println!("{}", self.context.formatter().format_info("cornfield - Mode interactif"));
        println!("{}", self.context.formatter().format_info("Tapez .help pour l'aide ou .exit pour quitter"));
        if self.context.verbosity() > 0 {
            println!("{}", self.context.formatter().format_info(&format!("Site {}", self.context.site().id())));
        }

        loop {
            match self.editor.readline("cornfield> ") {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());
                    self.history.add(&line);

                    match self.process_line(line.trim()) {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => println!("{}", self.context.formatter().format_error(&e.to_string())),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C
                    println!("Interruption (Ctrl-C)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl-D
                    break;
                }
                Err(err) => {
                    println!("{}", self.context.formatter().format_error(&format!("Erreur: {}", err)));
                    break;
                }
            }
        }

        self.history.save()?;
        println!("Au revoir !");

        Ok(())
    }

    /// Traite une ligne entrée par l'utilisateur; le point initial est facultatif
    fn process_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.strip_prefix('.').unwrap_or(line);
        let words = split_words(line)?;
        let Some(first) = words.first() else {
            return Ok(Flow::Continue);
        };

        match first.as_str() {
            "help" => self.print_help(),
            "exit" | "quit" => return Ok(Flow::Exit),
            "format" => {
                let format = match words.get(1).map(String::as_str) {
                    Some("text") => OutputFormat::Text,
                    Some("json") => OutputFormat::Json,
                    Some("table") => OutputFormat::Table,
                    _ => return Err(anyhow!("Usage: .format <text|json|table>")),
                };
                self.context.set_format(format);
                println!("{}", self.context.formatter().format_success(&format!("Format défini à {:?}", format)));
            }
            "history" => {
                let commands = match words.get(1) {
                    Some(pattern) => self.history.search(pattern),
                    None => self.history.get_all().to_vec(),
                };
                if commands.is_empty() {
                    println!("Aucune commande dans l'historique.");
                }
                for (i, cmd) in commands.iter().enumerate() {
                    println!("{}: {}", i + 1, cmd);
                }
            }
            _ => match ReplLine::try_parse_from(&words) {
                Ok(parsed) => commands::execute(&self.context, parsed.command)?,
                // Inclut l'aide demandée avec --help
                Err(e) => println!("{}", e),
            },
        }

        Ok(Flow::Continue)
    }

    /// Affiche l'aide
    fn print_help(&self) {
        println!("Commandes disponibles:");
        println!("  .view <ap> [-w prédicat] [-o clé]... [-r a:b] [-d] [-a alias=chemin]...");
        println!("  .search <ap> [-w prédicat]     Liste les items correspondants");
        println!("  .open <ap> <identité>          Ouvre un item (\"1/core\")");
        println!("  .explain <ap> [options de view] Affiche la chaîne de requête");
        println!("  .schema <ap>                   Affiche les propriétés déclarées");
        println!("  .list                          Liste les access points");
        println!("  .format <text|json|table>      Définit le format de sortie");
        println!("  .history [motif]               Affiche l'historique");
        println!("  .help                          Affiche cette aide");
        println!("  .exit, .quit                   Quitte le CLI");
    }
}

/// Découpe une ligne en mots; les guillemets simples ou doubles groupent
/// les espaces et se conservent à l'intérieur de l'autre type de guillemet
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(anyhow!("Guillemet non fermé"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words(r#"view people -w "address.city = 'London'" -o -born"#).unwrap(),
            vec!["view", "people", "-w", "address.city = 'London'", "-o", "-born"]
        );
        assert_eq!(split_words("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_words("open people ''").unwrap(), vec!["open", "people", ""]);
        assert!(split_words("view \"oops").is_err());
    }

    #[test]
    fn test_repl_line_uses_cli_commands() {
        let words = split_words("search people -w \"id = 1\"").unwrap();
        let parsed = ReplLine::try_parse_from(&words).unwrap();
        match parsed.command {
            Commands::Search { access_point, predicate } => {
                assert_eq!(access_point, "people");
                assert_eq!(predicate.as_deref(), Some("id = 1"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
