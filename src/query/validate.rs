//! Query validation
//!
//! Checks a chain against an access point's schema before any backend is
//! involved. Validation never modifies the chain.

use std::collections::BTreeSet;

use crate::core::errors::{Result, SiteError};
use crate::core::path::{PropertyRef, SYNTHETIC_PREFIX};
use crate::core::schema::Schema;
use crate::query::ops::{AggregateFn, AggregateSpec, QueryChain, QueryOp};
use crate::request::alias::Aliases;

/// Names a later operator may refer to
enum Scope<'a> {
    /// Declared properties, plus the aliases of the last `Select`
    Items(Option<&'a Aliases>),
    /// Only the columns an `Aggregate` produced
    Groups(BTreeSet<String>),
}

impl QueryChain {
    /// Check every property the chain references against `schema`.
    ///
    /// A reference is valid when it names an alias of the chain's
    /// `Select`, or resolves segment by segment against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        let mut scope = Scope::Items(None);

        for op in self.ops() {
            match op {
                QueryOp::Select(aliases) => {
                    if let Scope::Groups(_) = scope {
                        return Err(SiteError::MalformedRequest(
                            "select after aggregate is not supported".to_string(),
                        ));
                    }
                    validate_select(aliases, schema)?;
                    scope = Scope::Items(Some(aliases));
                }
                QueryOp::Filter(predicate) => {
                    for condition in predicate.conditions() {
                        check_reference(&condition.property, &scope, schema)?;
                    }
                }
                QueryOp::Order(keys) => {
                    for key in keys {
                        check_reference(&key.property, &scope, schema)?;
                    }
                }
                QueryOp::Aggregate(spec) => {
                    validate_aggregate(spec, &scope, schema)?;
                    let columns = spec
                        .group_by
                        .iter()
                        .map(PropertyRef::to_string)
                        .chain(spec.aggregations.iter().map(|a| a.alias.clone()))
                        .collect();
                    scope = Scope::Groups(columns);
                }
                QueryOp::Range(range) => {
                    if let Some(stop) = range.stop {
                        if range.start > stop {
                            return Err(SiteError::MalformedRequest(format!(
                                "range start {} is past its stop {}",
                                range.start, stop
                            )));
                        }
                    }
                }
                QueryOp::Distinct => {}
            }
        }

        Ok(())
    }
}

fn validate_select(aliases: &Aliases, schema: &Schema) -> Result<()> {
    for (alias, path) in aliases.iter() {
        if alias.is_empty() && path != "*" && !path.ends_with(".*") {
            return Err(SiteError::schema(
                path,
                "the empty alias can only expose a wildcard selection",
            ));
        }
        schema.resolve_selection(path)?;
    }
    Ok(())
}

fn validate_aggregate(spec: &AggregateSpec, scope: &Scope<'_>, schema: &Schema) -> Result<()> {
    for property in &spec.group_by {
        check_reference(property, scope, schema)?;
    }
    let mut seen = BTreeSet::new();
    for aggregation in &spec.aggregations {
        if !seen.insert(aggregation.alias.as_str()) {
            return Err(SiteError::MalformedRequest(format!(
                "aggregate column {:?} defined twice",
                aggregation.alias
            )));
        }
        match (&aggregation.property, aggregation.function) {
            (Some(property), _) => check_reference(property, scope, schema)?,
            (None, AggregateFn::Count) => {}
            (None, function) => {
                return Err(SiteError::MalformedRequest(format!(
                    "{:?} aggregate {:?} needs a property",
                    function, aggregation.alias
                )))
            }
        }
    }
    Ok(())
}

fn check_reference(property: &PropertyRef, scope: &Scope<'_>, schema: &Schema) -> Result<()> {
    let name = property.to_string();
    match scope {
        Scope::Groups(columns) => {
            if columns.contains(&name) {
                Ok(())
            } else {
                Err(SiteError::schema(name, "not a column of the aggregated rows"))
            }
        }
        Scope::Items(aliases) => {
            let selected = aliases.map_or(false, |a| property.is_leaf() && a.contains_alias(&name));
            if selected {
                return Ok(());
            }
            if name.starts_with(SYNTHETIC_PREFIX) {
                return Err(SiteError::schema(name, "synthetic alias is not selected"));
            }
            schema.resolve(property).map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Property, PropertyKind};
    use crate::query::builder::ViewRequest;
    use crate::query::ops::{Aggregation, OrderKey, SelectRange};
    use crate::request::ast::Predicate;

    fn schema() -> Schema {
        let address = Schema::new()
            .with(Property::new("city", PropertyKind::String)).unwrap();
        Schema::new()
            .with(Property::new("id", PropertyKind::Integer).identity()).unwrap()
            .with(Property::new("name", PropertyKind::String)).unwrap()
            .with(Property::new("born", PropertyKind::Integer)).unwrap()
            .with(Property::new("address", PropertyKind::Object(address))).unwrap()
    }

    #[test]
    fn test_built_chain_validates() {
        let chain = ViewRequest::new()
            .request("name = 'Ada' and address.city = 'London'")
            .order_by(vec![OrderKey::desc("born"), OrderKey::asc("address.city")])
            .range(10)
            .into_chain()
            .unwrap();
        chain.validate(&schema()).unwrap();
    }

    #[test]
    fn test_unknown_filter_property() {
        let chain = ViewRequest::new().request("ghost.field = 1").into_chain().unwrap();
        let err = chain.validate(&schema()).unwrap_err();
        assert!(matches!(err, SiteError::Schema { ref path, .. } if path == "ghost.field"));
    }

    #[test]
    fn test_unknown_selection() {
        let chain = ViewRequest::new()
            .aliases(Aliases::new().with("c", "address.country"))
            .into_chain()
            .unwrap();
        let err = chain.validate(&schema()).unwrap_err();
        assert!(matches!(err, SiteError::Schema { ref path, .. } if path == "address.country"));
    }

    #[test]
    fn test_unselected_synthetic_alias() {
        let chain = QueryChain::new()
            .then(QueryOp::Select(Aliases::select_all()))
            .then(QueryOp::Filter(Predicate::eq("__address_city", "Lyon")));
        let err = chain.validate(&schema()).unwrap_err();
        assert!(matches!(err, SiteError::Schema { ref path, .. } if path == "__address_city"));
    }

    #[test]
    fn test_order_by_alias() {
        let chain = ViewRequest::new()
            .aliases(Aliases::new().with("town", "address.city"))
            .order_by(vec![OrderKey::asc("town")])
            .into_chain()
            .unwrap();
        chain.validate(&schema()).unwrap();
    }

    #[test]
    fn test_aggregate_scope() {
        let spec = AggregateSpec::new()
            .group_by("address.city")
            .with(Aggregation::count("people"))
            .with(Aggregation::new("oldest", AggregateFn::Min, Some("born".into())));
        let chain = ViewRequest::new().aggregate(spec.clone()).into_chain().unwrap();
        chain.validate(&schema()).unwrap();

        let sorted = chain.clone().then(QueryOp::Order(vec![OrderKey::desc("people")]));
        sorted.validate(&schema()).unwrap();

        let bad = chain.then(QueryOp::Order(vec![OrderKey::asc("name")]));
        assert!(bad.validate(&schema()).is_err());
    }

    #[test]
    fn test_aggregate_needs_property() {
        let spec = AggregateSpec::new().with(Aggregation::new("total", AggregateFn::Sum, None));
        let chain = ViewRequest::new().aggregate(spec).into_chain().unwrap();
        assert!(matches!(chain.validate(&schema()), Err(SiteError::MalformedRequest(_))));
    }

    #[test]
    fn test_inverted_range() {
        let chain = QueryChain::new().then(QueryOp::Range(SelectRange::new(5, Some(2))));
        assert!(matches!(chain.validate(&schema()), Err(SiteError::MalformedRequest(_))));
    }

    #[test]
    fn test_empty_alias_needs_wildcard() {
        let chain = QueryChain::new().then(QueryOp::Select(Aliases::new().with("", "name")));
        assert!(chain.validate(&schema()).is_err());
    }

    #[test]
    fn test_validation_does_not_modify_chain() {
        let chain = ViewRequest::new().request("address.city = 'x'").into_chain().unwrap();
        let before = chain.clone();
        let _ = chain.validate(&schema());
        assert_eq!(chain, before);
    }
}
