//! In-process predicate evaluation
//!
//! Backends that cannot translate a request into their own query
//! language evaluate it item by item with this module.

use std::cmp::Ordering;

use crate::core::item::{self, Item};
use crate::core::path::PropertyRef;
use crate::core::value::Value;
use crate::request::ast::{Condition, Operator, Predicate};

/// Anything properties can be read from by dotted path
pub trait PropertyLookup {
    fn get_property(&self, path: &PropertyRef) -> Option<&Value>;
}

impl PropertyLookup for Item {
    fn get_property(&self, path: &PropertyRef) -> Option<&Value> {
        item::lookup(self, path)
    }
}

impl Predicate {
    /// Evaluate the predicate against `target`.
    ///
    /// Missing properties read as `Null`.
    pub fn matches<L: PropertyLookup + ?Sized>(&self, target: &L) -> bool {
        match self {
            Predicate::And(subs) => subs.iter().all(|s| s.matches(target)),
            Predicate::Or(subs) => subs.iter().any(|s| s.matches(target)),
            Predicate::Not(sub) => !sub.matches(target),
            Predicate::Condition(condition) => condition.matches(target),
        }
    }
}

impl Condition {
    /// Evaluate this single condition against `target`
    pub fn matches<L: PropertyLookup + ?Sized>(&self, target: &L) -> bool {
        let actual = target.get_property(&self.property).unwrap_or(&Value::Null);
        compare_values(actual, self.operator, &self.value)
    }
}

/// Apply `operator` to an item value and a request value
pub fn compare_values(actual: &Value, operator: Operator, expected: &Value) -> bool {
    match operator {
        Operator::Eq => actual.loose_eq(expected),
        Operator::Ne => !actual.loose_eq(expected),
        Operator::Lt => ordered(actual, expected, |o| o == Ordering::Less),
        Operator::Le => ordered(actual, expected, |o| o != Ordering::Greater),
        Operator::Gt => ordered(actual, expected, |o| o == Ordering::Greater),
        Operator::Ge => ordered(actual, expected, |o| o != Ordering::Less),
        Operator::Contains => match (actual, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::List(items), needle) => items.iter().any(|i| i.loose_eq(needle)),
            _ => false,
        },
        Operator::StartsWith => match (actual, expected) {
            (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        },
        Operator::In => match expected {
            Value::List(candidates) => candidates.iter().any(|c| actual.loose_eq(c)),
            _ => false,
        },
    }
}

/// Ordering comparisons only hold between comparable kinds; null never
/// compares
fn ordered<F: Fn(Ordering) -> bool>(actual: &Value, expected: &Value, accept: F) -> bool {
    let comparable = (actual.is_number() && expected.is_number())
        || (actual.is_string() && expected.is_string())
        || matches!((actual, expected), (Value::Boolean(_), Value::Boolean(_)));
    comparable && accept(actual.total_cmp(expected))
}
