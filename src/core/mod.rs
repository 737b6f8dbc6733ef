pub mod path;
pub mod value;
pub mod item;
pub mod schema;
pub mod access_point;
pub mod errors;


pub use path::{PropertyRef, SYNTHETIC_PREFIX};
pub use value::Value;
pub use item::Item;
pub use schema::{Property, PropertyKind, Schema};
pub use access_point::{AccessPoint, Rows, SiteId};
pub use errors::{Result, SiteError};
