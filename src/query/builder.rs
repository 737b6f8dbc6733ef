//! Building query chains from view parameters

use log::debug;

use crate::core::errors::Result;
use crate::query::ops::{AggregateSpec, OrderKey, QueryChain, QueryOp, SelectRange};
use crate::request::alias::{resolve_aliases, Aliases};
use crate::request::normalize::{make_request, RequestInput};

/// Parameters of a `view` call.
///
/// Every field is optional; an explicit `query` bypasses chain building
/// entirely.
#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    /// Selected columns, alias -> path. Defaults to every top-level property.
    pub aliases: Option<Aliases>,
    pub request: RequestInput,
    pub order_by: Option<Vec<OrderKey>>,
    pub range: Option<SelectRange>,
    pub distinct: bool,
    pub aggregate: Option<AggregateSpec>,
    /// Pre-built chain, used as-is
    pub query: Option<QueryChain>,
}

impl ViewRequest {
    pub fn new() -> Self {
        ViewRequest::default()
    }

    pub fn aliases(mut self, aliases: Aliases) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn request<R: Into<RequestInput>>(mut self, request: R) -> Self {
        self.request = request.into();
        self
    }

    pub fn order_by<I: IntoIterator<Item = OrderKey>>(mut self, keys: I) -> Self {
        self.order_by = Some(keys.into_iter().collect());
        self
    }

    pub fn range<R: Into<SelectRange>>(mut self, range: R) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn query(mut self, query: QueryChain) -> Self {
        self.query = Some(query);
        self
    }

    /// Turn the parameters into a query chain.
    ///
    /// Paths the filter uses but the selection does not expose get a
    /// synthetic alias, added to the `Select` operator so the backend can
    /// see them.
    pub fn into_chain(self) -> Result<QueryChain> {
        if let Some(query) = self.query {
            return Ok(query);
        }

        let aliases = self.aliases.unwrap_or_else(Aliases::select_all);
        let predicate = make_request(self.request)?;
        let (predicate, table) = resolve_aliases(&predicate, &aliases.invert());

        let mut chain = QueryChain::new();
        chain.push(QueryOp::Select(table.invert()));
        chain.push(QueryOp::Filter(predicate));
        if self.distinct {
            chain.push(QueryOp::Distinct);
        }
        if let Some(keys) = self.order_by {
            chain.push(QueryOp::Order(keys));
        }
        if let Some(aggregate) = self.aggregate {
            chain.push(QueryOp::Aggregate(aggregate));
        }
        if let Some(range) = self.range {
            chain.push(QueryOp::Range(range));
        }

        debug!("Built query chain: {}", chain.describe());
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::SYNTHETIC_PREFIX;
    use crate::query::ops::Aggregation;
    use crate::request::ast::Predicate;

    #[test]
    fn test_minimal_chain() {
        let chain = ViewRequest::new().into_chain().unwrap();
        assert_eq!(
            chain,
            QueryChain::new()
                .then(QueryOp::Select(Aliases::select_all()))
                .then(QueryOp::Filter(Predicate::all()))
        );
    }

    #[test]
    fn test_operator_order_is_fixed() {
        let chain = ViewRequest::new()
            .range(5)
            .aggregate(AggregateSpec::new().with(Aggregation::count("n")))
            .order_by(vec![OrderKey::asc("name")])
            .distinct()
            .into_chain()
            .unwrap();
        assert_eq!(chain.describe(), "select > filter > distinct > order > aggregate > range");
    }

    #[test]
    fn test_range_forms_build_same_operator() {
        let single = ViewRequest::new().range(5).into_chain().unwrap();
        let pair = ViewRequest::new().range((0, 5)).into_chain().unwrap();
        assert_eq!(single.ops().last(), pair.ops().last());
        assert_eq!(single.ops().last(), Some(&QueryOp::Range(SelectRange::new(0, Some(5)))));
    }

    #[test]
    fn test_select_contains_every_filter_alias() {
        let chain = ViewRequest::new()
            .aliases(Aliases::new().with("n", "name"))
            .request("name = 'Ada' and address.city = 'London' or not meta.tags.first = 'x'")
            .into_chain()
            .unwrap();
        let select = chain.select().unwrap();
        for condition in chain.filter().unwrap().conditions() {
            let name = condition.property.to_string();
            assert!(select.contains_alias(&name), "{} not selected", name);
        }
        let synthetic: Vec<_> = select.iter().filter(|(a, _)| a.starts_with(SYNTHETIC_PREFIX)).collect();
        assert_eq!(synthetic, vec![("__address_city", "address.city"), ("__meta_tags_first", "meta.tags.first")]);
        assert_eq!(select.get("n"), Some("name"));
    }

    #[test]
    fn test_explicit_query_is_used_as_is() {
        let query = QueryChain::new().then(QueryOp::Distinct);
        let chain = ViewRequest::new().request("x = 1").query(query.clone()).into_chain().unwrap();
        assert_eq!(chain, query);
    }

    #[test]
    fn test_malformed_request_fails() {
        assert!(ViewRequest::new().request("x =").into_chain().is_err());
    }
}
