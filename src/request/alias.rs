//! Alias resolution
//!
//! Backends only see the columns a query selects. To filter on a path the
//! caller did not select, the resolver gives that path a synthetic name,
//! records it in the alias table so the `Select` operator exposes it, and
//! rewrites the condition to use the synthetic name.

use std::collections::BTreeMap;
use log::debug;
use serde::{Serialize, Deserialize};

use crate::core::path::{PropertyRef, SYNTHETIC_PREFIX, WILDCARD};
use crate::request::ast::{Condition, Predicate};

/// Filler replacing path separators in synthetic names
const FILLER: char = '_';

/// Selection as callers write it: alias name -> property path.
///
/// The empty alias mapped to `"*"` exposes every top-level property under
/// its own name; `"a.*"` exposes the fields of `a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aliases(BTreeMap<String, String>);

impl Aliases {
    /// No selected column at all
    pub fn new() -> Self {
        Aliases::default()
    }

    /// Every top-level property under its own name
    pub fn select_all() -> Self {
        let mut aliases = Aliases::new();
        aliases.insert("", WILDCARD);
        aliases
    }

    pub fn insert<A: Into<String>, P: Into<String>>(&mut self, alias: A, path: P) {
        self.0.insert(alias.into(), path.into());
    }

    /// Builder-style `insert`
    pub fn with<A: Into<String>, P: Into<String>>(mut self, alias: A, path: P) -> Self {
        self.insert(alias, path);
        self
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.0.get(alias).map(String::as_str)
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.0.contains_key(alias)
    }

    /// Iterate over `(alias, path)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, p)| (a.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Turn into the resolver's path -> alias direction.
    ///
    /// Two aliases of the same path collapse into one entry.
    pub fn invert(&self) -> AliasTable {
        AliasTable(self.0.iter().map(|(a, p)| (p.clone(), a.clone())).collect())
    }
}

impl<A: Into<String>, P: Into<String>> FromIterator<(A, P)> for Aliases {
    fn from_iter<I: IntoIterator<Item = (A, P)>>(iter: I) -> Self {
        Aliases(iter.into_iter().map(|(a, p)| (a.into(), p.into())).collect())
    }
}

/// Resolver table: property path -> alias name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable(BTreeMap<String, String>);

impl AliasTable {
    pub fn new() -> Self {
        AliasTable::default()
    }

    /// Alias under which `path` is selected
    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Check if `name` is already used as an alias
    pub fn contains_alias(&self, name: &str) -> bool {
        self.0.values().any(|v| v == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Synthetic aliases minted by the resolver
    pub fn synthetic(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, a)| a.starts_with(SYNTHETIC_PREFIX))
            .map(|(p, a)| (p.as_str(), a.as_str()))
    }

    /// Turn back into the caller's alias -> path direction
    pub fn invert(&self) -> Aliases {
        Aliases(self.0.iter().map(|(p, a)| (a.clone(), p.clone())).collect())
    }

    /// Give `path` a fresh synthetic alias and return it.
    ///
    /// The name is derived from the path; a numeric suffix keeps it unique
    /// when two paths flatten to the same name ("a.b_c" and "a_b.c").
    fn mint(&mut self, path: &str) -> String {
        let base = format!("{}{}", SYNTHETIC_PREFIX, path.replace('.', &FILLER.to_string()));
        let mut name = base.clone();
        let mut suffix = 2;
        while self.contains_alias(&name) {
            name = format!("{}{}{}", base, FILLER, suffix);
            suffix += 1;
        }
        debug!("Aliasing {:?} as {:?}", path, name);
        self.0.insert(path.to_string(), name.clone());
        name
    }
}

/// Rewrite every condition of `predicate` against `table`.
///
/// Returns the rewritten predicate and the table extended with every
/// synthetic alias minted along the way. Neither input is modified.
pub fn resolve_aliases(predicate: &Predicate, table: &AliasTable) -> (Predicate, AliasTable) {
    let mut table = table.clone();
    let resolved = predicate.map_conditions(&mut |condition: &Condition| {
        let mut condition = condition.clone();
        resolve_property(&mut condition.property, &mut table);
        condition
    });
    (resolved, table)
}

fn resolve_property(property: &mut PropertyRef, table: &mut AliasTable) {
    let name = property.to_string();
    if let Some(alias) = table.alias_of(&name) {
        // The complete path is already selected, use its alias
        let alias = alias.to_string();
        property.collapse(alias);
        return;
    }

    // Names that are already aliases, and paths exposed by their parent's
    // wildcard, are visible to the backend as-is
    let visible = table.contains_alias(&name) || table.contains_path(&property.parent_wildcard());
    if !visible {
        let alias = table.mint(&name);
        property.collapse(alias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn names(predicate: &Predicate) -> Vec<String> {
        predicate.conditions().iter().map(|c| c.property.to_string()).collect()
    }

    #[test]
    fn test_wildcard_paths_pass_through() {
        let table = Aliases::select_all().invert();
        let p = Predicate::eq("name", "Ada").and(Predicate::eq("address.city", "London"));
        let (resolved, table) = resolve_aliases(&p, &table);
        assert_eq!(names(&resolved), vec!["name", "__address_city"]);
        assert_eq!(table.alias_of("address.city"), Some("__address_city"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_selected_path_uses_alias() {
        let table = Aliases::new().with("town", "address.city").invert();
        let (resolved, table) = resolve_aliases(&Predicate::eq("address.city", "Lyon"), &table);
        assert_eq!(names(&resolved), vec!["town"]);
        assert!(resolved.conditions()[0].property.is_leaf());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parent_wildcard_leaves_reference() {
        let table = Aliases::new().with("addr", "address.*").invert();
        let (resolved, table) = resolve_aliases(&Predicate::eq("address.city", "Lyon"), &table);
        assert_eq!(names(&resolved), vec!["address.city"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_pass_through_alias_never_renamed() {
        let table = Aliases::new().with("town", "address.city").invert();
        let (resolved, table) = resolve_aliases(&Predicate::eq("town", "Lyon"), &table);
        assert_eq!(names(&resolved), vec!["town"]);
        assert_eq!(table, Aliases::new().with("town", "address.city").invert());
    }

    #[test]
    fn test_idempotence() {
        let table = Aliases::select_all().invert();
        let p = Predicate::eq("a.b", 1)
            .and(Predicate::eq("c.d.e", 2).or(Predicate::eq("a.b", 3).negate()))
            .and(Predicate::eq("f", 4));
        let (first, table1) = resolve_aliases(&p, &table);
        let (second, table2) = resolve_aliases(&first, &table1);
        assert_eq!(first, second);
        assert_eq!(table1, table2);
    }

    #[test]
    fn test_one_alias_per_path() {
        let table = Aliases::new().invert();
        let p = Predicate::eq("a.b", 1).and(Predicate::eq("a.b", 2)).and(Predicate::eq("x", 3));
        let (resolved, table) = resolve_aliases(&p, &table);
        assert_eq!(names(&resolved), vec!["__a_b", "__a_b", "__x"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_distinct_paths_get_distinct_names() {
        let table = Aliases::new().invert();
        let paths = ["a.b_c", "a_b.c", "a.b.c", "a_b_c", "z"];
        let p = Predicate::And(paths.iter().map(|path| Predicate::eq(*path, 1)).collect());
        let (resolved, table) = resolve_aliases(&p, &table);
        let minted: HashSet<String> = names(&resolved).into_iter().collect();
        assert_eq!(minted.len(), paths.len());
        assert!(minted.iter().all(|n| n.starts_with(SYNTHETIC_PREFIX)));
        assert_eq!(table.synthetic().count(), paths.len());
    }

    #[test]
    fn test_input_tree_untouched() {
        let table = Aliases::new().invert();
        let p = Predicate::eq("a.b", 1).negate();
        let before = p.clone();
        let _ = resolve_aliases(&p, &table);
        assert_eq!(p, before);
    }

    #[test]
    fn test_round_trip_inversion() {
        let aliases = Aliases::select_all().with("n", "name");
        assert_eq!(aliases.invert().invert(), aliases);
    }
}
