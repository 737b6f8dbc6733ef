//! The access point interface
//!
//! An access point is a named data source registered in a site. The site
//! only talks to it through this trait, one method per operation.

use std::fmt;
use uuid::Uuid;

use crate::core::errors::{Result, SiteError};
use crate::core::item::Item;
use crate::core::schema::{Property, Schema};
use crate::query::ops::QueryChain;
use crate::request::ast::Predicate;

/// Identifier of a site, handed to access points when they are bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteId(Uuid);

impl SiteId {
    pub fn new() -> Self {
        SiteId(Uuid::new_v4())
    }
}

impl Default for SiteId {
    fn default() -> Self {
        SiteId::new()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lazy stream of result rows.
///
/// Rows are produced on demand; a backend failure shows up as an `Err`
/// item and does not stop the caller from reading what came before.
pub struct Rows<'a> {
    inner: Box<dyn Iterator<Item = Result<Item>> + 'a>,
}

impl<'a> Rows<'a> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<Item>> + 'a,
    {
        Rows {
            inner: Box::new(iter),
        }
    }

    /// Rows from already-computed items
    pub fn from_items(items: Vec<Item>) -> Self {
        Rows::new(items.into_iter().map(Ok))
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rows { .. }")
    }
}

/// Trait implemented by every data source a site can dispatch to
pub trait AccessPoint: Send + Sync {
    /// Declared properties
    fn properties(&self) -> &Schema;

    /// Properties identifying an item, in declaration order
    fn identity_properties(&self) -> Vec<&Property> {
        self.properties().identity_properties()
    }

    /// Called once when the access point is registered
    fn bind(&mut self, _site: SiteId, _name: &str) {}

    /// Run a validated query chain
    fn view(&self, chain: &QueryChain) -> Result<Rows<'_>>;

    /// All items matching `request`
    fn search(&self, request: Predicate) -> Result<Vec<Item>> {
        self.view(&QueryChain::filtered(request))?.collect()
    }

    /// The single item matching `request`.
    ///
    /// Falls back to `default` when nothing matches.
    fn open(&self, request: Predicate, default: Option<Item>) -> Result<Item> {
        let text = request.to_string();
        let mut found = self.search(request)?;
        match found.len() {
            0 => default.ok_or(SiteError::NotFound(text)),
            1 => Ok(found.remove(0)),
            count => Err(SiteError::MultipleMatches {
                request: text,
                count,
            }),
        }
    }

    /// Store a new item and return it as stored
    fn create(&mut self, item: Item) -> Result<Item>;

    /// Store `item`, replacing the item with the same identity
    fn save(&mut self, item: Item) -> Result<()>;

    /// Remove the item with the same identity as `item`
    fn delete(&mut self, item: &Item) -> Result<()>;

    /// Remove every item matching `request`, returning how many went
    fn delete_many(&mut self, request: Predicate) -> Result<usize> {
        let doomed = self.search(request)?;
        for item in &doomed {
            self.delete(item)?;
        }
        Ok(doomed.len())
    }
}
