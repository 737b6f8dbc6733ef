//! In-memory access point for cornfield
//!
//! Keeps items in a vector and answers views with the generic executor.
//! Good enough for tests, demos and small config-defined sites.

use log::debug;

use crate::core::access_point::{AccessPoint, Rows, SiteId};
use crate::core::errors::{Result, SiteError};
use crate::core::item::Item;
use crate::core::schema::{PropertyKind, Schema};
use crate::core::value::Value;
use crate::query::executor::execute;
use crate::query::ops::QueryChain;

/// An access point storing its items in memory
#[derive(Debug, Default)]
pub struct MemoryAccessPoint {
    schema: Schema,
    items: Vec<Item>,
    /// Site and name given at registration
    binding: Option<(SiteId, String)>,
}

impl MemoryAccessPoint {
    /// Create an empty access point with the given schema
    pub fn new(schema: Schema) -> Self {
        MemoryAccessPoint {
            schema,
            items: Vec::new(),
            binding: None,
        }
    }

    /// Create an access point holding `items`, each checked like `create`
    pub fn with_items<I: IntoIterator<Item = Item>>(schema: Schema, items: I) -> Result<Self> {
        let mut access_point = MemoryAccessPoint::new(schema);
        for item in items {
            access_point.create(item)?;
        }
        Ok(access_point)
    }

    /// Name under which the access point was registered
    pub fn name(&self) -> Option<&str> {
        self.binding.as_ref().map(|(_, name)| name.as_str())
    }

    pub fn site(&self) -> Option<SiteId> {
        self.binding.as_ref().map(|(site, _)| *site)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values of the identity properties; the whole item when none are declared
    fn identity_of(&self, item: &Item) -> Vec<Value> {
        let identity = self.schema.identity_properties();
        if identity.is_empty() {
            return vec![Value::Object(item.clone())];
        }
        identity
            .iter()
            .map(|p| item.get(&p.name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn position(&self, item: &Item) -> Option<usize> {
        let identity = self.identity_of(item);
        self.items.iter().position(|other| self.identity_of(other) == identity)
    }

    fn describe(&self, item: &Item) -> String {
        self.identity_of(item)
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Check `item` against the schema and coerce its values
    fn conform(&self, item: Item) -> Result<Item> {
        let item = conform_object(&self.schema, item, "")?;
        for property in self.schema.identity_properties() {
            if item.get(&property.name).map_or(true, Value::is_null) {
                return Err(SiteError::schema(&property.name, "identity property is missing"));
            }
        }
        Ok(item)
    }
}

fn conform_object(schema: &Schema, item: Item, prefix: &str) -> Result<Item> {
    item.into_iter()
        .map(|(key, value)| {
            let path = format!("{}{}", prefix, key);
            let property = schema
                .get(&key)
                .ok_or_else(|| SiteError::schema(&path, "property is not declared"))?;
            let value = match (&property.kind, value) {
                (PropertyKind::Object(inner), Value::Object(fields)) => {
                    Value::Object(conform_object(inner, fields, &format!("{}.", path))?)
                }
                (kind, value) => kind
                    .coerce(value)
                    .map_err(|reason| SiteError::schema(&path, reason))?,
            };
            Ok((key, value))
        })
        .collect()
}

impl AccessPoint for MemoryAccessPoint {
    fn properties(&self) -> &Schema {
        &self.schema
    }

    fn bind(&mut self, site: SiteId, name: &str) {
        debug!("Memory access point bound as {:?} in site {}", name, site);
        self.binding = Some((site, name.to_string()));
    }

    fn view(&self, chain: &QueryChain) -> Result<Rows<'_>> {
        Ok(Rows::new(execute(chain, self.items.iter().cloned().map(Ok))))
    }

    fn create(&mut self, item: Item) -> Result<Item> {
        let item = self.conform(item)?;
        if self.position(&item).is_some() {
            return Err(SiteError::Backend(format!(
                "an item with identity {} already exists",
                self.describe(&item)
            )));
        }
        self.items.push(item.clone());
        Ok(item)
    }

    fn save(&mut self, item: Item) -> Result<()> {
        let item = self.conform(item)?;
        match self.position(&item) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
        Ok(())
    }

    fn delete(&mut self, item: &Item) -> Result<()> {
        match self.position(item) {
            Some(index) => {
                self.items.remove(index);
                Ok(())
            }
            None => Err(SiteError::NotFound(self.describe(item))),
        }
    }
}
