//! Property paths for cornfield
//!
//! This module defines `PropertyRef`, a dotted path into an item's
//! schema (e.g. "author.address.city"). A reference is a head segment
//! with an optional child reference, so nested paths through related
//! properties are represented as a chain.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Marker prefixed to every name minted by the alias resolver.
///
/// Caller-declared properties may never start with it, so synthetic
/// names can be told apart (and stripped) by their prefix alone.
pub const SYNTHETIC_PREFIX: &str = "__";

/// Segment used for "every property below this point" in alias paths
pub const WILDCARD: &str = "*";

/// Errors that can occur when working with property paths
#[derive(Error, Debug, PartialEq)]
pub enum PathError {
    #[error("Invalid path format: {0}")]
    InvalidFormat(String),
    #[error("Empty path")]
    EmptyPath,
}

/// A reference to a (possibly nested) property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyRef {
    /// Name of the first segment
    pub name: String,
    /// Rest of the path, if any
    pub child: Option<Box<PropertyRef>>,
}

impl PropertyRef {
    /// Create a single-segment reference
    pub fn new<S: Into<String>>(name: S) -> Self {
        PropertyRef {
            name: name.into(),
            child: None,
        }
    }

    /// Build a reference from a dotted string without validating it.
    ///
    /// Empty segments are kept as-is; they never resolve against a schema,
    /// so the validator reports them instead.
    pub fn from_dotted(path: &str) -> Self {
        let mut segments = path.rsplit('.');
        // rsplit always yields at least one item
        let last = segments.next().unwrap_or_default();
        let mut current = PropertyRef::new(last);
        for segment in segments {
            current = PropertyRef {
                name: segment.to_string(),
                child: Some(Box::new(current)),
            };
        }
        current
    }

    /// Build a reference from a list of segments
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::EmptyPath);
        }
        Ok(PropertyRef::from_dotted(&segments.join(".")))
    }

    /// Iterate over the segment names, head first
    pub fn segments(&self) -> Segments<'_> {
        Segments { next: Some(self) }
    }

    /// Number of segments in the path
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// A reference always has at least its head segment
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if the path has a single segment
    pub fn is_leaf(&self) -> bool {
        self.child.is_none()
    }

    /// Name of the last segment
    pub fn leaf_name(&self) -> &str {
        let mut current = self;
        while let Some(child) = &current.child {
            current = child;
        }
        &current.name
    }

    /// Dotted path of everything but the last segment
    pub fn parent(&self) -> Option<String> {
        let segments: Vec<&str> = self.segments().collect();
        if segments.len() < 2 {
            return None;
        }
        Some(segments[..segments.len() - 1].join("."))
    }

    /// Alias key that would expose this path through its parent's wildcard
    /// ("a.b.c" -> "a.b.*", "a" -> "*")
    pub fn parent_wildcard(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}.{}", parent, WILDCARD),
            None => WILDCARD.to_string(),
        }
    }

    /// Check if this reference names a synthetic alias
    pub fn is_synthetic(&self) -> bool {
        self.is_leaf() && self.name.starts_with(SYNTHETIC_PREFIX)
    }

    /// Replace the whole path with a single segment
    pub fn collapse<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
        self.child = None;
    }
}

/// Iterator over the segment names of a `PropertyRef`
pub struct Segments<'a> {
    next: Option<&'a PropertyRef>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.child.as_deref();
        Some(current.name.as_str())
    }
}

/// Parse a dotted string into a reference, rejecting empty segments
impl FromStr for PropertyRef {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::EmptyPath);
        }
        if s.split('.').any(str::is_empty) {
            return Err(PathError::InvalidFormat(s.to_string()));
        }
        Ok(PropertyRef::from_dotted(s))
    }
}

impl TryFrom<String> for PropertyRef {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PropertyRef> for String {
    fn from(path: PropertyRef) -> Self {
        path.to_string()
    }
}

impl From<&str> for PropertyRef {
    fn from(path: &str) -> Self {
        PropertyRef::from_dotted(path)
    }
}

/// Format a reference as a string with dot separators
impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path_str = self.segments().collect::<Vec<_>>().join(".");
        write!(f, "{}", path_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parsing() {
        let path = "author.address.city".parse::<PropertyRef>().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.name, "author");
        assert_eq!(path.leaf_name(), "city");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["author", "address", "city"]);
    }

    #[test]
    fn test_path_formatting() {
        let path = PropertyRef::from_segments(["author", "address", "city"]).unwrap();
        assert_eq!(path.to_string(), "author.address.city");
    }

    #[test]
    fn test_invalid_paths() {
        assert_eq!("".parse::<PropertyRef>(), Err(PathError::EmptyPath));
        assert!(matches!("a..b".parse::<PropertyRef>(), Err(PathError::InvalidFormat(_))));
        assert_eq!(PropertyRef::from_segments(Vec::<String>::new()), Err(PathError::EmptyPath));
    }

    #[test]
    fn test_parent_wildcard() {
        assert_eq!(PropertyRef::from("a.b.c").parent_wildcard(), "a.b.*");
        assert_eq!(PropertyRef::from("a").parent_wildcard(), "*");
        assert_eq!(PropertyRef::from("a").parent(), None);
    }

    #[test]
    fn test_collapse() {
        let mut path = PropertyRef::from("author.name");
        path.collapse("__author_name");
        assert!(path.is_leaf());
        assert!(path.is_synthetic());
        assert_eq!(path.to_string(), "__author_name");
    }

    #[test]
    fn test_serde_as_dotted_string() {
        let path = PropertyRef::from("a.b");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a.b\"");
        let back: PropertyRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
