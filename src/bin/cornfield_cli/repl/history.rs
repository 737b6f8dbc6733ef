use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use anyhow::Result;

/// Historique des commandes, persisté entre les sessions
pub struct History {
    /// Chemin du fichier d'historique
    file_path: PathBuf,

    /// Commandes en mémoire
    commands: Vec<String>,

    /// Taille maximale de l'historique
    max_size: usize,
}

impl History {
    pub fn new<P: Into<PathBuf>>(file_path: P, max_size: usize) -> Self {
        History {
            file_path: file_path.into(),
            commands: Vec::new(),
            max_size,
        }
    }

    /// ~/.cornfield_history, ou le répertoire courant sans HOME
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(".cornfield_history")
    }

    /// Charge l'historique depuis le fichier, s'il existe
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&self.file_path)?);
        self.commands.clear();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                self.commands.push(line);
            }
        }

        // Garder les plus récentes
        if self.commands.len() > self.max_size {
            let excess = self.commands.len() - self.max_size;
            self.commands.drain(..excess);
        }

        Ok(())
    }

    /// Sauvegarde l'historique dans le fichier
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.file_path)?;

        for cmd in &self.commands {
            writeln!(file, "{}", cmd)?;
        }

        Ok(())
    }

    /// Ajoute une commande; les lignes vides et les doublons consécutifs sont ignorés
    pub fn add(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() || self.commands.last().map(String::as_str) == Some(command) {
            return;
        }

        self.commands.push(command.to_string());
        if self.commands.len() > self.max_size {
            self.commands.remove(0);
        }
    }

    pub fn get_all(&self) -> &[String] {
        &self.commands
    }

    /// Commandes contenant `pattern`
    pub fn search(&self, pattern: &str) -> Vec<String> {
        self.commands
            .iter()
            .filter(|cmd| cmd.contains(pattern))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_add_skips_blank_and_repeated() {
        let mut history = History::new("unused", 2);
        history.add("  ");
        history.add(".list");
        history.add(".list");
        history.add(".schema people");
        history.add(".view people");
        assert_eq!(history.get_all(), &[".schema people", ".view people"]);
        assert_eq!(history.search("people").len(), 2);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history");

        let mut history = History::new(&path, 10);
        history.add(".list");
        history.add(".view people -w \"id = 1\"");
        history.save().unwrap();

        let mut reloaded = History::new(&path, 1);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get_all(), &[".view people -w \"id = 1\""]);
    }
}
