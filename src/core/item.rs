//! Items as produced by access points
//!
//! An item is a mapping from property name to value. The dispatcher
//! only looks at key names; values are interpreted by backends and by
//! the in-process executor.

use std::collections::BTreeMap;

use super::path::{PropertyRef, SYNTHETIC_PREFIX};
use super::value::Value;

/// A single item (or result row)
pub type Item = BTreeMap<String, Value>;

/// Follow a dotted path into an item
pub fn lookup<'a>(item: &'a Item, path: &PropertyRef) -> Option<&'a Value> {
    let head = item.get(&path.name)?;
    match &path.child {
        Some(child) => head.lookup(child),
        None => Some(head),
    }
}

/// Remove every key minted by the alias resolver
pub fn strip_synthetic(mut item: Item) -> Item {
    item.retain(|key, _| !key.starts_with(SYNTHETIC_PREFIX));
    item
}

/// Build an item from a JSON object
pub fn from_json(map: serde_json::Map<String, serde_json::Value>) -> Item {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

/// Convert an item to a JSON object
pub fn to_json(item: &Item) -> serde_json::Value {
    serde_json::Value::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
            .collect(),
    )
}

/// Render an item on several lines, nested objects indented
pub fn to_string_pretty(item: &Item, indent: usize) -> String {
    if item.is_empty() {
        return "{}".to_string();
    }

    let mut result = "{\n".to_string();
    for (key, value) in item {
        let indentation = " ".repeat(indent + 2);
        let value_str = match value {
            Value::Object(map) => to_string_pretty(map, indent + 2),
            other => other.to_string(),
        };
        result.push_str(&format!("{}\"{}\": {},\n", indentation, key, value_str));
    }

    // Remove trailing comma
    result.pop();
    result.pop();
    result.push('\n');
    result.push_str(&" ".repeat(indent));
    result.push('}');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Item {
        let serde_json::Value::Object(map) = json!({
            "name": "Ada",
            "address": {"city": "London"},
            "__address_city": "London"
        }) else {
            unreachable!()
        };
        from_json(map)
    }

    #[test]
    fn test_lookup() {
        let item = sample();
        assert_eq!(lookup(&item, &"address.city".into()), Some(&Value::from("London")));
        assert_eq!(lookup(&item, &"name".into()), Some(&Value::from("Ada")));
        assert_eq!(lookup(&item, &"name.first".into()), None);
    }

    #[test]
    fn test_strip_synthetic() {
        let item = strip_synthetic(sample());
        assert!(item.keys().all(|k| !k.starts_with("__")));
        assert_eq!(item.len(), 2);
    }

    #[test]
    fn test_pretty() {
        let pretty = to_string_pretty(&sample(), 0);
        assert!(pretty.starts_with("{\n"));
        assert!(pretty.contains("  \"name\": \"Ada\""));
        assert!(pretty.contains("    \"city\": \"London\""));
        assert!(pretty.ends_with('}'));
    }
}
