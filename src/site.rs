//! Site: the dispatcher binding names to access points
//!
//! Every call names an access point. View calls are turned into a query
//! chain, validated against the access point's schema and only then
//! handed to the backend. Result rows come back stripped of synthetic
//! alias columns.

use std::collections::HashMap;
use log::{debug, info, warn};

use crate::core::access_point::{AccessPoint, Rows, SiteId};
use crate::core::errors::{Result, SiteError};
use crate::core::item::{self, Item};
use crate::core::value::Value;
use crate::query::builder::ViewRequest;
use crate::query::ops::QueryChain;
use crate::request::ast::{Condition, Operator, Predicate};
use crate::request::normalize::{normalize, RequestInput};

/// Separator between identity values in a repr string
pub const REPR_DELIMITER: char = '/';

/// A set of named access points
pub struct Site {
    id: SiteId,
    access_points: HashMap<String, Box<dyn AccessPoint>>,
}

impl Default for Site {
    fn default() -> Self {
        Site::new()
    }
}

impl Site {
    /// Create an empty site
    pub fn new() -> Self {
        Site {
            id: SiteId::new(),
            access_points: HashMap::new(),
        }
    }

    pub fn id(&self) -> SiteId {
        self.id
    }

    /// Register `access_point` under `name`.
    ///
    /// Fails when the name is taken; the existing registration is kept.
    pub fn register<A: AccessPoint + 'static>(&mut self, name: &str, access_point: A) -> Result<()> {
        self.register_boxed(name, Box::new(access_point))
    }

    pub fn register_boxed(&mut self, name: &str, mut access_point: Box<dyn AccessPoint>) -> Result<()> {
        if self.access_points.contains_key(name) {
            return Err(SiteError::DuplicateRegistration(name.to_string()));
        }
        access_point.bind(self.id, name);
        self.access_points.insert(name.to_string(), access_point);
        info!("Registered access point {:?} in site {}", name, self.id);
        Ok(())
    }

    /// Remove and return the access point registered under `name`
    pub fn deregister(&mut self, name: &str) -> Result<Box<dyn AccessPoint>> {
        let access_point = self
            .access_points
            .remove(name)
            .ok_or_else(|| SiteError::UnknownAccessPoint(name.to_string()))?;
        info!("Deregistered access point {:?} from site {}", name, self.id);
        Ok(access_point)
    }

    pub fn access_point(&self, name: &str) -> Result<&dyn AccessPoint> {
        self.access_points
            .get(name)
            .map(|ap| ap.as_ref())
            .ok_or_else(|| SiteError::UnknownAccessPoint(name.to_string()))
    }

    fn access_point_mut(&mut self, name: &str) -> Result<&mut Box<dyn AccessPoint>> {
        self.access_points
            .get_mut(name)
            .ok_or_else(|| SiteError::UnknownAccessPoint(name.to_string()))
    }

    /// Registered names, sorted
    pub fn access_point_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.access_points.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build and validate the chain a `view` call would run
    pub fn explain(&self, name: &str, request: ViewRequest) -> Result<QueryChain> {
        let access_point = self.access_point(name)?;
        let chain = request.into_chain()?;
        chain.validate(access_point.properties())?;
        Ok(chain)
    }

    /// Query an access point.
    ///
    /// Nothing reaches the backend unless the whole chain validates.
    pub fn view(&self, name: &str, request: ViewRequest) -> Result<Rows<'_>> {
        let chain = self.explain(name, request)?;
        debug!("Dispatching view on {:?}: {}", name, chain.describe());
        let rows = self.access_point(name)?.view(&chain)?;
        let name = name.to_string();
        Ok(Rows::new(rows.map(move |row| match row {
            Ok(row) => Ok(item::strip_synthetic(row)),
            Err(e) => {
                warn!("Access point {:?} failed while producing rows: {}", name, e);
                Err(e)
            }
        })))
    }

    fn normalized<R: Into<RequestInput>>(&self, name: &str, request: R) -> Result<Predicate> {
        normalize(self.access_point(name)?.properties(), request.into())
    }

    pub fn search<R: Into<RequestInput>>(&self, name: &str, request: R) -> Result<Vec<Item>> {
        let request = self.normalized(name, request)?;
        self.access_point(name)?.search(request)
    }

    pub fn open<R: Into<RequestInput>>(&self, name: &str, request: R, default: Option<Item>) -> Result<Item> {
        let request = self.normalized(name, request)?;
        self.access_point(name)?.open(request, default)
    }

    pub fn create(&mut self, name: &str, item: Item) -> Result<Item> {
        self.access_point_mut(name)?.create(item)
    }

    pub fn save(&mut self, name: &str, item: Item) -> Result<()> {
        self.access_point_mut(name)?.save(item)
    }

    pub fn delete(&mut self, name: &str, item: &Item) -> Result<()> {
        self.access_point_mut(name)?.delete(item)
    }

    pub fn delete_many<R: Into<RequestInput>>(&mut self, name: &str, request: R) -> Result<usize> {
        let request = self.normalized(name, request)?;
        self.access_point_mut(name)?.delete_many(request)
    }

    /// Identity string of `item`: its identity values joined with `/`
    pub fn repr(&self, name: &str, item: &Item) -> Result<String> {
        let access_point = self.access_point(name)?;
        let mut parts = Vec::new();
        for property in access_point.identity_properties() {
            let part = match item.get(&property.name) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => {
                    return Err(SiteError::schema(&property.name, "identity property is missing"))
                }
                Some(other) => other.to_string(),
            };
            if part.contains(REPR_DELIMITER) {
                return Err(SiteError::MalformedRequest(format!(
                    "identity value {:?} contains the delimiter {:?}",
                    part, REPR_DELIMITER
                )));
            }
            parts.push(part);
        }
        Ok(parts.join(&REPR_DELIMITER.to_string()))
    }

    /// Open the item whose identity string is `repr`
    pub fn from_repr(&self, name: &str, repr: &str, default: Option<Item>) -> Result<Item> {
        let identity: Vec<String> = self
            .access_point(name)?
            .identity_properties()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        let parts: Vec<&str> = repr.split(REPR_DELIMITER).collect();
        if identity.is_empty() || parts.len() != identity.len() {
            return Err(SiteError::MalformedRequest(format!(
                "{:?} has {} part(s), {:?} is identified by {}",
                repr,
                parts.len(),
                name,
                identity.len()
            )));
        }

        let request = Predicate::And(
            identity
                .iter()
                .zip(parts)
                .map(|(property, value)| Condition::new(property.as_str(), Operator::Eq, value).into())
                .collect(),
        );
        self.open(name, request, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use serde_json::json;
    use crate::core::schema::{Property, PropertyKind, Schema};
    use crate::core::path::SYNTHETIC_PREFIX;
    use crate::request::alias::Aliases;
    use crate::storage::memory::MemoryAccessPoint;

    /// Access point that logs every call and returns canned rows
    struct Recorder {
        schema: Schema,
        rows: Vec<Item>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(calls: Arc<Mutex<Vec<String>>>) -> Self {
            let address = Schema::new()
                .with(Property::new("city", PropertyKind::String)).unwrap();
            let schema = Schema::new()
                .with(Property::new("x", PropertyKind::Integer).identity()).unwrap()
                .with(Property::new("address", PropertyKind::Object(address))).unwrap();
            let mut row = Item::new();
            row.insert("x".to_string(), Value::Integer(1));
            row.insert("__address_city".to_string(), Value::from("Lyon"));
            Recorder {
                schema,
                rows: vec![row],
                calls,
            }
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl AccessPoint for Recorder {
        fn properties(&self) -> &Schema {
            &self.schema
        }

        fn bind(&mut self, site: SiteId, name: &str) {
            let _ = site;
            self.log(format!("bind {}", name));
        }

        fn view(&self, chain: &QueryChain) -> Result<Rows<'_>> {
            self.log(format!("view {}", chain.describe()));
            Ok(Rows::from_items(self.rows.clone()))
        }

        fn search(&self, request: Predicate) -> Result<Vec<Item>> {
            self.log(format!("search {}", request));
            Ok(self.rows.clone())
        }

        fn create(&mut self, item: Item) -> Result<Item> {
            self.log("create".to_string());
            Ok(item)
        }

        fn save(&mut self, _item: Item) -> Result<()> {
            self.log("save".to_string());
            Ok(())
        }

        fn delete(&mut self, _item: &Item) -> Result<()> {
            self.log("delete".to_string());
            Ok(())
        }
    }

    fn recorded() -> (Site, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut site = Site::new();
        site.register("ap", Recorder::new(calls.clone())).unwrap();
        (site, calls)
    }

    fn people() -> MemoryAccessPoint {
        let schema = Schema::new()
            .with(Property::new("id", PropertyKind::Integer).identity()).unwrap()
            .with(Property::new("team", PropertyKind::String).identity()).unwrap()
            .with(Property::new("name", PropertyKind::String)).unwrap();
        let items = [
            json!({"id": 1, "team": "core", "name": "Ada"}),
            json!({"id": 2, "team": "core", "name": "Grace"}),
            json!({"id": 1, "team": "web", "name": "Alan"}),
        ]
        .into_iter()
        .map(|v| match v {
            serde_json::Value::Object(map) => item::from_json(map),
            _ => unreachable!(),
        });
        MemoryAccessPoint::with_items(schema, items).unwrap()
    }

    #[test]
    fn test_view_fails_fast_on_unknown_property() {
        let (site, calls) = recorded();
        let err = site.view("ap", ViewRequest::new().request("ghost.field = 1")).unwrap_err();
        assert!(matches!(err, SiteError::Schema { ref path, .. } if path == "ghost.field"));
        assert_eq!(*calls.lock().unwrap(), vec!["bind ap"]);
    }

    #[test]
    fn test_view_strips_synthetic_columns() {
        let (site, calls) = recorded();
        let rows: Vec<Item> = site
            .view("ap", ViewRequest::new().request("address.city = 'Lyon'"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].keys().all(|k| !k.starts_with(SYNTHETIC_PREFIX)));
        assert_eq!(rows[0].get("x"), Some(&Value::Integer(1)));
        assert_eq!(calls.lock().unwrap().last().unwrap(), "view select > filter");
    }

    #[test]
    fn test_search_forwards_normalized_request() {
        let (site, calls) = recorded();
        let found = site.search("ap", json!({"x": "1"})).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(calls.lock().unwrap().last().unwrap(), "search (x = 1)");

        let err = site.search("ap", json!({"y": 1})).unwrap_err();
        assert!(matches!(err, SiteError::Schema { .. }));
    }

    #[test]
    fn test_write_operations_are_forwarded() {
        let (mut site, calls) = recorded();
        site.create("ap", Item::new()).unwrap();
        site.save("ap", Item::new()).unwrap();
        site.delete("ap", &Item::new()).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["bind ap", "create", "save", "delete"]);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut site = Site::new();
        site.register("foo", people()).unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let err = site.register("foo", Recorder::new(calls.clone())).unwrap_err();
        assert!(matches!(err, SiteError::DuplicateRegistration(ref n) if n == "foo"));
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(site.search("foo", RequestInput::Everything).unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_and_deregistered_access_points() {
        let mut site = Site::new();
        assert!(matches!(
            site.view("nope", ViewRequest::new()),
            Err(SiteError::UnknownAccessPoint(_))
        ));
        site.register("people", people()).unwrap();
        assert_eq!(site.access_point_names(), vec!["people"]);
        site.deregister("people").unwrap();
        assert!(matches!(
            site.search("people", RequestInput::Everything),
            Err(SiteError::UnknownAccessPoint(_))
        ));
        assert!(site.deregister("people").is_err());
    }

    #[test]
    fn test_view_on_memory_access_point() {
        let mut site = Site::new();
        site.register("people", people()).unwrap();
        let rows: Vec<Item> = site
            .view(
                "people",
                ViewRequest::new()
                    .aliases(Aliases::new().with("who", "name"))
                    .request("team = 'core'")
                    .order_by(vec!["-id".parse().unwrap()]),
            )
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.get("who").cloned().unwrap()).collect();
        assert_eq!(names, vec![Value::from("Grace"), Value::from("Ada")]);
        assert!(rows.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_repr_round_trip() {
        let mut site = Site::new();
        site.register("people", people()).unwrap();
        let alan = site.from_repr("people", "1/web", None).unwrap();
        assert_eq!(alan.get("name"), Some(&Value::from("Alan")));
        assert_eq!(site.repr("people", &alan).unwrap(), "1/web");

        assert!(matches!(site.from_repr("people", "1", None), Err(SiteError::MalformedRequest(_))));
        assert!(matches!(site.from_repr("people", "1/web/x", None), Err(SiteError::MalformedRequest(_))));
        assert!(matches!(site.from_repr("people", "9/web", None), Err(SiteError::NotFound(_))));
    }

    #[test]
    fn test_repr_rejects_delimiter_in_values() {
        let mut site = Site::new();
        site.register("people", people()).unwrap();
        let mut item = Item::new();
        item.insert("id".to_string(), Value::Integer(3));
        item.insert("team".to_string(), Value::from("a/b"));
        assert!(matches!(site.repr("people", &item), Err(SiteError::MalformedRequest(_))));
    }

    #[test]
    fn test_delete_many_normalizes() {
        let mut site = Site::new();
        site.register("people", people()).unwrap();
        assert_eq!(site.delete_many("people", "team = 'core'").unwrap(), 2);
        assert_eq!(site.search("people", RequestInput::Everything).unwrap().len(), 1);
    }
}
