//! Cornfield: a query-translation and dispatch layer
//!
//! Callers describe what they want from a named access point (a predicate,
//! an ordering, a range, aggregates) without knowing how the access point
//! stores its items. A `Site` turns the request into a query chain,
//! validates it against the access point's declared properties and hands
//! it to the backend.

pub mod core;
pub mod request;
pub mod query;
pub mod storage;
pub mod site;
pub mod config;

// Ré-exporter les types principaux pour faciliter l'utilisation
pub use crate::core::access_point::{AccessPoint, Rows, SiteId};
pub use crate::core::errors::{Result, SiteError};
pub use crate::core::item::Item;
pub use crate::core::path::PropertyRef;
pub use crate::core::schema::{Property, PropertyKind, Schema};
pub use crate::core::value::Value;
pub use request::{Condition, Operator, Predicate, RequestInput};
pub use request::alias::Aliases;
pub use query::{AggregateSpec, Aggregation, AggregateFn, OrderKey, QueryChain, QueryOp, SelectRange, ViewRequest};
pub use storage::MemoryAccessPoint;
pub use site::Site;
pub use config::SiteConfig;
