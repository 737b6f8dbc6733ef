//! Query operators
//!
//! A query is an ordered chain of operators. The order is the logical
//! evaluation order: select the visible columns, filter, then optionally
//! distinct, order, aggregate, and finally cut a range.

use std::fmt;
use std::ops::{Range, RangeFrom};
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::core::errors::{Result, SiteError};
use crate::core::path::PropertyRef;
use crate::request::alias::Aliases;
use crate::request::ast::Predicate;

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub property: PropertyRef,
    pub descending: bool,
}

impl OrderKey {
    pub fn asc<P: Into<PropertyRef>>(property: P) -> Self {
        OrderKey {
            property: property.into(),
            descending: false,
        }
    }

    pub fn desc<P: Into<PropertyRef>>(property: P) -> Self {
        OrderKey {
            property: property.into(),
            descending: true,
        }
    }
}

/// Parse `"name"` (ascending) or `"-name"` (descending)
impl FromStr for OrderKey {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        let (descending, path) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        Ok(OrderKey {
            property: path.parse()?,
            descending,
        })
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-")?;
        }
        write!(f, "{}", self.property)
    }
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFn {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl FromStr for AggregateFn {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateFn::Count),
            "sum" => Ok(AggregateFn::Sum),
            "min" => Ok(AggregateFn::Min),
            "max" => Ok(AggregateFn::Max),
            "avg" => Ok(AggregateFn::Avg),
            other => Err(SiteError::MalformedRequest(format!(
                "unknown aggregate function {:?}",
                other
            ))),
        }
    }
}

/// A named aggregate column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Column name in the result rows
    pub alias: String,
    pub function: AggregateFn,
    /// Aggregated property; `count` without one counts rows
    pub property: Option<PropertyRef>,
}

impl Aggregation {
    pub fn new<A: Into<String>>(alias: A, function: AggregateFn, property: Option<PropertyRef>) -> Self {
        Aggregation {
            alias: alias.into(),
            function,
            property,
        }
    }

    pub fn count<A: Into<String>>(alias: A) -> Self {
        Aggregation::new(alias, AggregateFn::Count, None)
    }
}

/// Grouping and aggregate columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub group_by: Vec<PropertyRef>,
    pub aggregations: Vec<Aggregation>,
}

impl AggregateSpec {
    pub fn new() -> Self {
        AggregateSpec::default()
    }

    pub fn group_by<P: Into<PropertyRef>>(mut self, property: P) -> Self {
        self.group_by.push(property.into());
        self
    }

    pub fn with(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }
}

/// Half-open row interval `[start, stop)`; no stop means "to the end"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRange {
    pub start: usize,
    pub stop: Option<usize>,
}

impl SelectRange {
    pub fn new(start: usize, stop: Option<usize>) -> Self {
        SelectRange { start, stop }
    }

    /// Maximum number of rows the range lets through
    pub fn limit(&self) -> Option<usize> {
        self.stop.map(|stop| stop.saturating_sub(self.start))
    }
}

/// A single bound is the stop of a range starting at zero
impl From<usize> for SelectRange {
    fn from(stop: usize) -> Self {
        SelectRange::new(0, Some(stop))
    }
}

impl From<(usize, usize)> for SelectRange {
    fn from((start, stop): (usize, usize)) -> Self {
        SelectRange::new(start, Some(stop))
    }
}

impl From<Range<usize>> for SelectRange {
    fn from(range: Range<usize>) -> Self {
        SelectRange::new(range.start, Some(range.end))
    }
}

impl From<RangeFrom<usize>> for SelectRange {
    fn from(range: RangeFrom<usize>) -> Self {
        SelectRange::new(range.start, None)
    }
}

/// Parse `"stop"`, `"start:stop"` or `"start:"`
impl FromStr for SelectRange {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || SiteError::MalformedRequest(format!("invalid range {:?}", s));
        let parse = |part: &str| part.trim().parse::<usize>().map_err(|_| bad());
        match s.split_once(':') {
            None => Ok(SelectRange::from(parse(s)?)),
            Some((start, stop)) => {
                let start = if start.trim().is_empty() { 0 } else { parse(start)? };
                let stop = if stop.trim().is_empty() { None } else { Some(parse(stop)?) };
                Ok(SelectRange::new(start, stop))
            }
        }
    }
}

impl fmt::Display for SelectRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stop {
            Some(stop) => write!(f, "{}:{}", self.start, stop),
            None => write!(f, "{}:", self.start),
        }
    }
}

/// A query operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOp {
    /// Visible columns: alias -> property path
    Select(Aliases),
    Filter(Predicate),
    Distinct,
    Order(Vec<OrderKey>),
    Aggregate(AggregateSpec),
    Range(SelectRange),
}

impl QueryOp {
    /// Operator name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            QueryOp::Select(_) => "select",
            QueryOp::Filter(_) => "filter",
            QueryOp::Distinct => "distinct",
            QueryOp::Order(_) => "order",
            QueryOp::Aggregate(_) => "aggregate",
            QueryOp::Range(_) => "range",
        }
    }
}

/// An ordered chain of operators forming a full query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryChain {
    ops: Vec<QueryOp>,
}

impl QueryChain {
    pub fn new() -> Self {
        QueryChain::default()
    }

    /// Chain selecting every top-level property of the items matching
    /// `predicate`
    pub fn filtered(predicate: Predicate) -> Self {
        QueryChain::new()
            .then(QueryOp::Select(Aliases::select_all()))
            .then(QueryOp::Filter(predicate))
    }

    pub fn push(&mut self, op: QueryOp) {
        self.ops.push(op);
    }

    /// Builder-style `push`
    pub fn then(mut self, op: QueryOp) -> Self {
        self.push(op);
        self
    }

    pub fn ops(&self) -> &[QueryOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Aliases of the first `Select` operator
    pub fn select(&self) -> Option<&Aliases> {
        self.ops.iter().find_map(|op| match op {
            QueryOp::Select(aliases) => Some(aliases),
            _ => None,
        })
    }

    /// Predicate of the first `Filter` operator
    pub fn filter(&self) -> Option<&Predicate> {
        self.ops.iter().find_map(|op| match op {
            QueryOp::Filter(predicate) => Some(predicate),
            _ => None,
        })
    }

    /// Operator names, e.g. "select > filter > range"
    pub fn describe(&self) -> String {
        self.ops.iter().map(QueryOp::name).collect::<Vec<_>>().join(" > ")
    }
}

impl FromIterator<QueryOp> for QueryChain {
    fn from_iter<I: IntoIterator<Item = QueryOp>>(iter: I) -> Self {
        QueryChain {
            ops: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_forms_agree() {
        assert_eq!(SelectRange::from(5), SelectRange::from((0, 5)));
        assert_eq!(SelectRange::from(0..5), SelectRange::from((0, 5)));
        assert_eq!(SelectRange::from(3..), SelectRange::new(3, None));
        assert_eq!(SelectRange::from((2, 5)).limit(), Some(3));
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("5".parse::<SelectRange>().unwrap(), SelectRange::from(5));
        assert_eq!("2:7".parse::<SelectRange>().unwrap(), SelectRange::from((2, 7)));
        assert_eq!("4:".parse::<SelectRange>().unwrap(), SelectRange::new(4, None));
        assert_eq!(":3".parse::<SelectRange>().unwrap(), SelectRange::from(3));
        assert!("a:b".parse::<SelectRange>().is_err());
        assert_eq!(SelectRange::from((2, 7)).to_string(), "2:7");
    }

    #[test]
    fn test_order_key_parsing() {
        assert_eq!("-born".parse::<OrderKey>().unwrap(), OrderKey::desc("born"));
        assert_eq!("address.city".parse::<OrderKey>().unwrap(), OrderKey::asc("address.city"));
        assert_eq!(OrderKey::desc("born").to_string(), "-born");
        assert!("-".parse::<OrderKey>().is_err());
    }

    #[test]
    fn test_chain_accessors() {
        let chain = QueryChain::filtered(Predicate::eq("a", 1)).then(QueryOp::Range(5.into()));
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.select(), Some(&Aliases::select_all()));
        assert_eq!(chain.filter(), Some(&Predicate::eq("a", 1)));
        assert_eq!(chain.describe(), "select > filter > range");
    }

    #[test]
    fn test_chain_serializes() {
        let chain = QueryChain::filtered(Predicate::eq("a", 1)).then(QueryOp::Distinct);
        let json = serde_json::to_value(&chain).unwrap();
        assert_eq!(json["ops"][0]["select"][""], "*");
        assert_eq!(json["ops"][2], "distinct");
        let back: QueryChain = serde_json::from_value(json).unwrap();
        assert_eq!(back, chain);
    }
}
