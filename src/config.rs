//! Site configuration
//!
//! A whole site can be described in a JSON document: its access points,
//! their declared properties and, optionally, the items they start with.
//!
//! ```json
//! {
//!   "access_points": [{
//!     "name": "people",
//!     "properties": [
//!       {"name": "id", "type": "integer", "identity": true},
//!       {"name": "address", "type": "object", "properties": [
//!         {"name": "city", "type": "string"}
//!       ]}
//!     ],
//!     "items": [{"id": 1, "address": {"city": "London"}}]
//!   }]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use log::info;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SiteError};
use crate::core::item;
use crate::core::schema::{Property, PropertyKind, Schema};
use crate::site::Site;
use crate::storage::memory::MemoryAccessPoint;

/// Declared type of a configured property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    #[default]
    Any,
    String,
    Integer,
    Float,
    Boolean,
    List,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: KindName,
    #[serde(default)]
    pub identity: bool,
    /// Sub-properties of an `object` property
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPointConfig {
    pub name: String,
    pub properties: Vec<PropertyConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Configuration of a whole site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub access_points: Vec<AccessPointConfig>,
}

impl SiteConfig {
    /// Load a configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        text.parse()
    }

    /// Build a site holding one in-memory access point per entry
    pub fn build(&self) -> Result<Site> {
        let mut site = Site::new();
        for config in &self.access_points {
            let access_point = config
                .build()
                .map_err(|e| SiteError::Config(format!("access point {:?}: {}", config.name, e)))?;
            site.register(&config.name, access_point)?;
        }
        info!("Built site with {} access point(s)", self.access_points.len());
        Ok(site)
    }
}

impl FromStr for SiteConfig {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

impl AccessPointConfig {
    pub fn schema(&self) -> Result<Schema> {
        build_schema(&self.properties)
    }

    pub fn build(&self) -> Result<MemoryAccessPoint> {
        let items = self.items.iter().cloned().map(item::from_json);
        MemoryAccessPoint::with_items(self.schema()?, items)
    }
}

impl PropertyConfig {
    pub fn to_property(&self) -> Result<Property> {
        let kind = match self.kind {
            KindName::Object => PropertyKind::Object(build_schema(&self.properties)?),
            _ if !self.properties.is_empty() => {
                return Err(SiteError::schema(
                    &self.name,
                    "only object properties can declare sub-properties",
                ))
            }
            KindName::Any => PropertyKind::Any,
            KindName::String => PropertyKind::String,
            KindName::Integer => PropertyKind::Integer,
            KindName::Float => PropertyKind::Float,
            KindName::Boolean => PropertyKind::Boolean,
            KindName::List => PropertyKind::List,
        };
        let property = Property::new(self.name.clone(), kind);
        Ok(if self.identity { property.identity() } else { property })
    }
}

fn build_schema(properties: &[PropertyConfig]) -> Result<Schema> {
    let mut schema = Schema::new();
    for config in properties {
        schema.add(config.to_property()?)?;
    }
    Ok(schema)
}
