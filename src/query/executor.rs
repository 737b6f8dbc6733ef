//! Generic query executor
//!
//! Runs a query chain over a stream of items in-process. Backends with no
//! query language of their own hand their items to `execute`.
//!
//! Select, filter and range stay lazy. Distinct, order and aggregate need
//! every row, so they buffer the stream the first time a row is pulled.

use std::collections::{HashMap, HashSet};
use std::iter;
use log::{trace, warn};

use crate::core::errors::Result;
use crate::core::item::{self, Item};
use crate::core::path::{PropertyRef, WILDCARD};
use crate::core::value::Value;
use crate::query::ops::{AggregateFn, AggregateSpec, Aggregation, OrderKey, QueryChain, QueryOp, SelectRange};
use crate::request::alias::Aliases;
use crate::request::evaluator::PropertyLookup;

/// Stream of result rows
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Item>> + 'a>;

/// A row being computed, with the item it was projected from
struct Frame {
    row: Item,
    source: Option<Item>,
}

type FrameIter<'a> = Box<dyn Iterator<Item = Result<Frame>> + 'a>;

/// Lookups try the projected row first, then the source item, so a path
/// exposed through a wildcard stays addressable in full
impl PropertyLookup for Frame {
    fn get_property(&self, path: &PropertyRef) -> Option<&Value> {
        if !path.is_leaf() {
            if let Some(value) = self.row.get(&path.to_string()) {
                return Some(value);
            }
        }
        item::lookup(&self.row, path)
            .or_else(|| self.source.as_ref().and_then(|source| item::lookup(source, path)))
    }
}

impl Frame {
    fn value_of(&self, path: &PropertyRef) -> Value {
        self.get_property(path).cloned().unwrap_or(Value::Null)
    }
}

/// Execute `chain` over `items`
pub fn execute<'a, I>(chain: &QueryChain, items: I) -> RowIter<'a>
where
    I: IntoIterator<Item = Result<Item>>,
    I::IntoIter: 'a,
{
    let mut frames: FrameIter<'a> = Box::new(
        items
            .into_iter()
            .map(|item| item.map(|row| Frame { row, source: None })),
    );

    for op in chain.ops() {
        trace!("Executor stage: {}", op.name());
        frames = match op.clone() {
            QueryOp::Select(aliases) => {
                Box::new(frames.map(move |frame| frame.map(|f| project(&aliases, f))))
            }
            QueryOp::Filter(predicate) => Box::new(frames.filter(move |frame| match frame {
                Ok(f) => predicate.matches(f),
                Err(_) => true,
            })),
            QueryOp::Distinct => buffered(frames, distinct),
            QueryOp::Order(keys) => buffered(frames, move |f| order(f, &keys)),
            QueryOp::Aggregate(spec) => buffered(frames, move |f| aggregate(f, &spec)),
            QueryOp::Range(range) => cut(frames, range),
        };
    }

    Box::new(frames.map(|frame| {
        frame.map(|f| f.row).map_err(|e| {
            warn!("Row failed mid-stream: {}", e);
            e
        })
    }))
}

/// Build the visible row for `frame` according to `aliases`
fn project(aliases: &Aliases, frame: Frame) -> Frame {
    let source = frame.row;
    let mut row = Item::new();

    for (alias, path) in aliases.iter() {
        let selected = if path == WILDCARD {
            Some(Value::Object(source.clone()))
        } else if let Some(parent) = path.strip_suffix(".*") {
            item::lookup(&source, &PropertyRef::from_dotted(parent)).cloned()
        } else {
            item::lookup(&source, &PropertyRef::from_dotted(path)).cloned()
        };

        if alias.is_empty() {
            // Spread the selected object into the row
            if let Some(Value::Object(fields)) = selected {
                row.extend(fields);
            }
        } else {
            row.insert(alias.to_string(), selected.unwrap_or(Value::Null));
        }
    }

    Frame {
        row,
        source: Some(source),
    }
}

/// Collect the whole stream on first pull, apply `f`, then replay it.
///
/// The first error ends the stream.
fn buffered<'a, F>(frames: FrameIter<'a>, f: F) -> FrameIter<'a>
where
    F: FnOnce(Vec<Frame>) -> Vec<Frame> + 'a,
{
    let mut pending = Some((frames, f));
    Box::new(iter::once(()).flat_map(move |_| -> FrameIter<'a> {
        match pending.take() {
            Some((frames, f)) => match frames.collect::<Result<Vec<_>>>() {
                Ok(collected) => Box::new(f(collected).into_iter().map(Ok)),
                Err(e) => Box::new(iter::once(Err(e))),
            },
            None => Box::new(iter::empty()),
        }
    }))
}

fn cut<'a>(frames: FrameIter<'a>, range: SelectRange) -> FrameIter<'a> {
    let skipped = frames.skip(range.start);
    match range.limit() {
        Some(limit) => Box::new(skipped.take(limit)),
        None => Box::new(skipped),
    }
}

fn row_key(row: &Item) -> String {
    item::to_json(row).to_string()
}

fn distinct(frames: Vec<Frame>) -> Vec<Frame> {
    let mut seen = HashSet::new();
    frames.into_iter().filter(|f| seen.insert(row_key(&f.row))).collect()
}

fn order(mut frames: Vec<Frame>, keys: &[OrderKey]) -> Vec<Frame> {
    frames.sort_by(|a, b| {
        for key in keys {
            let ordering = a.value_of(&key.property).total_cmp(&b.value_of(&key.property));
            let ordering = if key.descending { ordering.reverse() } else { ordering };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
    frames
}

fn aggregate(frames: Vec<Frame>, spec: &AggregateSpec) -> Vec<Frame> {
    // Groups in order of first appearance
    let mut groups: Vec<(Vec<Value>, Vec<Frame>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for frame in frames {
        let key: Vec<Value> = spec.group_by.iter().map(|p| frame.value_of(p)).collect();
        let key_str = serde_json::Value::from(&Value::List(key.clone())).to_string();
        match index.get(&key_str) {
            Some(&i) => groups[i].1.push(frame),
            None => {
                index.insert(key_str, groups.len());
                groups.push((key, vec![frame]));
            }
        }
    }

    // Aggregating nothing without grouping still yields one row
    if groups.is_empty() && spec.group_by.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let mut row = Item::new();
            for (property, value) in spec.group_by.iter().zip(key) {
                row.insert(property.to_string(), value);
            }
            for aggregation in &spec.aggregations {
                row.insert(aggregation.alias.clone(), compute(aggregation, &members));
            }
            Frame { row, source: None }
        })
        .collect()
}

fn compute(aggregation: &Aggregation, members: &[Frame]) -> Value {
    let values: Vec<Value> = match &aggregation.property {
        Some(property) => members
            .iter()
            .map(|f| f.value_of(property))
            .filter(|v| !v.is_null())
            .collect(),
        None => members.iter().map(|_| Value::Boolean(true)).collect(),
    };

    match aggregation.function {
        AggregateFn::Count => Value::Integer(values.len() as i64),
        AggregateFn::Sum => {
            // Integer sums stay integers until they overflow
            let exact = values.iter().try_fold(0i64, |total, v| match v {
                Value::Integer(i) => total.checked_add(*i),
                _ => None,
            });
            match exact {
                Some(total) => Value::Integer(total),
                None => Value::Float(values.iter().filter_map(Value::as_f64).sum()),
            }
        }
        AggregateFn::Min => values.into_iter().min_by(|a, b| a.total_cmp(b)).unwrap_or(Value::Null),
        AggregateFn::Max => values.into_iter().max_by(|a, b| a.total_cmp(b)).unwrap_or(Value::Null),
        AggregateFn::Avg => {
            let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
    }
}
