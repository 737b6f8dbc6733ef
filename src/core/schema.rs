//! Property declarations
//!
//! An access point declares the properties its items carry. The schema
//! is what requests and query chains are validated against.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::errors::{Result, SiteError};
use super::path::{PropertyRef, SYNTHETIC_PREFIX};
use super::value::Value;

/// Type of a declared property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Any value is accepted as-is
    Any,
    String,
    Integer,
    Float,
    Boolean,
    List,
    /// Nested object with its own declared properties
    Object(Schema),
}

impl PropertyKind {
    /// Convert `value` to this kind, if the conversion makes sense.
    ///
    /// Strings are parsed for numeric and boolean kinds so identity values
    /// coming from a repr string can be matched against typed properties.
    pub fn coerce(&self, value: Value) -> std::result::Result<Value, String> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (PropertyKind::Any, v) => Ok(v),
            (PropertyKind::String, Value::String(s)) => Ok(Value::String(s)),
            (PropertyKind::String, Value::Integer(i)) => Ok(Value::String(i.to_string())),
            (PropertyKind::String, Value::Float(f)) => Ok(Value::String(f.to_string())),
            (PropertyKind::String, Value::Boolean(b)) => Ok(Value::String(b.to_string())),
            (PropertyKind::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
            (PropertyKind::Integer, Value::Float(f)) if f.fract() == 0.0 => {
                // i64::MAX as f64 rounds up to 2^63, which is already out of range
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(Value::Integer(f as i64))
                } else {
                    Err(format!("cannot read {} as an integer", f))
                }
            }
            (PropertyKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("cannot read {:?} as an integer", s)),
            (PropertyKind::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (PropertyKind::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (PropertyKind::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("cannot read {:?} as a float", s)),
            (PropertyKind::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (PropertyKind::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(format!("cannot read {:?} as a boolean", s)),
            },
            (PropertyKind::List, Value::List(items)) => Ok(Value::List(items)),
            (PropertyKind::Object(_), Value::Object(map)) => Ok(Value::Object(map)),
            (kind, v) => Err(format!("expected {}, got {}", kind, v.type_name())),
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Any => "any",
            PropertyKind::String => "string",
            PropertyKind::Integer => "integer",
            PropertyKind::Float => "float",
            PropertyKind::Boolean => "boolean",
            PropertyKind::List => "list",
            PropertyKind::Object(_) => "object",
        };
        write!(f, "{}", name)
    }
}

/// A declared property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
    /// Part of the item's identity
    pub identity: bool,
}

impl Property {
    pub fn new<S: Into<String>>(name: S, kind: PropertyKind) -> Self {
        Property {
            name: name.into(),
            kind,
            identity: false,
        }
    }

    /// Mark the property as part of the identity
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

/// Ordered set of declared properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    properties: Vec<Property>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Schema::default()
    }

    /// Declare a property.
    ///
    /// Names must be non-empty, dot-free, unique, and must not carry the
    /// synthetic alias prefix.
    pub fn add(&mut self, property: Property) -> Result<()> {
        let name = &property.name;
        if name.is_empty() || name.contains('.') || name == "*" {
            return Err(SiteError::schema(name, "invalid property name"));
        }
        if name.starts_with(SYNTHETIC_PREFIX) {
            return Err(SiteError::schema(
                name,
                format!("property names may not start with {:?}", SYNTHETIC_PREFIX),
            ));
        }
        if self.get(name).is_some() {
            return Err(SiteError::schema(name, "property declared twice"));
        }
        self.properties.push(property);
        Ok(())
    }

    /// Builder-style `add`
    pub fn with(mut self, property: Property) -> Result<Self> {
        self.add(property)?;
        Ok(self)
    }

    /// Get a top-level property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// All properties in declaration order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Identity properties in declaration order
    pub fn identity_properties(&self) -> Vec<&Property> {
        self.properties.iter().filter(|p| p.identity).collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolve a dotted path segment by segment.
    ///
    /// Walking into an `Any` property accepts whatever follows it.
    pub fn resolve(&self, path: &PropertyRef) -> Result<&Property> {
        let mut schema = self;
        let mut walked: Vec<&str> = Vec::new();
        let mut segments = path.segments().peekable();
        while let Some(segment) = segments.next() {
            walked.push(segment);
            let property = schema.get(segment).ok_or_else(|| {
                SiteError::schema(path, format!("no property named {:?}", walked.join(".")))
            })?;
            if segments.peek().is_none() {
                return Ok(property);
            }
            match &property.kind {
                PropertyKind::Object(inner) => schema = inner,
                PropertyKind::Any => return Ok(property),
                kind => {
                    return Err(SiteError::schema(
                        path,
                        format!("{:?} is a {} and has no sub-properties", walked.join("."), kind),
                    ))
                }
            }
        }
        // segments() always yields the head segment
        Err(SiteError::schema(path, "empty path"))
    }

    /// Resolve a path that may end with the wildcard segment ("a.*" or "*")
    pub fn resolve_selection(&self, path: &str) -> Result<()> {
        if path == "*" {
            return Ok(());
        }
        match path.strip_suffix(".*") {
            Some(parent) => {
                let property = self.resolve(&PropertyRef::from_dotted(parent))?;
                match property.kind {
                    PropertyKind::Object(_) | PropertyKind::Any => Ok(()),
                    ref kind => Err(SiteError::schema(
                        path,
                        format!("cannot select every field of a {}", kind),
                    )),
                }
            }
            None => self.resolve(&PropertyRef::from_dotted(path)).map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Schema {
        let address = Schema::new()
            .with(Property::new("city", PropertyKind::String)).unwrap()
            .with(Property::new("zip", PropertyKind::Integer)).unwrap();
        Schema::new()
            .with(Property::new("id", PropertyKind::Integer).identity()).unwrap()
            .with(Property::new("name", PropertyKind::String)).unwrap()
            .with(Property::new("address", PropertyKind::Object(address))).unwrap()
            .with(Property::new("extra", PropertyKind::Any)).unwrap()
    }

    #[test]
    fn test_resolve_nested() {
        let schema = people();
        let city = schema.resolve(&PropertyRef::from("address.city")).unwrap();
        assert_eq!(city.kind, PropertyKind::String);
        assert!(schema.resolve(&PropertyRef::from("extra.whatever.deep")).is_ok());
    }

    #[test]
    fn test_resolve_failures() {
        let schema = people();
        let err = schema.resolve(&PropertyRef::from("ghost.field")).unwrap_err();
        assert!(matches!(err, SiteError::Schema { ref path, .. } if path == "ghost.field"));
        assert!(schema.resolve(&PropertyRef::from("name.first")).is_err());
        assert!(schema.resolve(&PropertyRef::from("address.country")).is_err());
    }

    #[test]
    fn test_resolve_selection() {
        let schema = people();
        assert!(schema.resolve_selection("*").is_ok());
        assert!(schema.resolve_selection("address.*").is_ok());
        assert!(schema.resolve_selection("name.*").is_err());
        assert!(schema.resolve_selection("address.zip").is_ok());
    }

    #[test]
    fn test_reserved_names_rejected() {
        let mut schema = Schema::new();
        assert!(schema.add(Property::new("__secret", PropertyKind::Any)).is_err());
        assert!(schema.add(Property::new("a.b", PropertyKind::Any)).is_err());
        schema.add(Property::new("a", PropertyKind::Any)).unwrap();
        assert!(schema.add(Property::new("a", PropertyKind::String)).is_err());
    }

    #[test]
    fn test_identity_properties_keep_order() {
        let schema = Schema::new()
            .with(Property::new("year", PropertyKind::Integer).identity()).unwrap()
            .with(Property::new("title", PropertyKind::String)).unwrap()
            .with(Property::new("slug", PropertyKind::String).identity()).unwrap();
        let names: Vec<_> = schema.identity_properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["year", "slug"]);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(PropertyKind::Integer.coerce("42".into()), Ok(Value::Integer(42)));
        assert_eq!(PropertyKind::Float.coerce(Value::Integer(2)), Ok(Value::Float(2.0)));
        assert_eq!(PropertyKind::Boolean.coerce("true".into()), Ok(Value::Boolean(true)));
        assert_eq!(PropertyKind::String.coerce(Value::Integer(7)), Ok(Value::from("7")));
        assert!(PropertyKind::Integer.coerce("abc".into()).is_err());
        assert!(PropertyKind::List.coerce(Value::Integer(1)).is_err());
        assert_eq!(PropertyKind::Integer.coerce(Value::Null), Ok(Value::Null));
        assert_eq!(PropertyKind::Integer.coerce(Value::Float(-3.0)), Ok(Value::Integer(-3)));
        assert_eq!(PropertyKind::Integer.coerce(Value::Float(i64::MIN as f64)), Ok(Value::Integer(i64::MIN)));
        let err = PropertyKind::Integer.coerce(Value::Float(1e30)).unwrap_err();
        assert!(err.contains("as an integer"), "{}", err);
        assert!(PropertyKind::Integer.coerce(Value::Float(i64::MAX as f64)).is_err());
        assert!(PropertyKind::Integer.coerce(Value::Float(-1e19)).is_err());
    }
}
