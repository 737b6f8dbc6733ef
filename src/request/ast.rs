//! Abstract syntax tree for requests
//!
//! A request is a boolean predicate over item properties: conditions
//! combined with `And`, `Or` and `Not`. Each node has exactly one owner;
//! rewriting passes build new trees instead of mutating shared ones.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::path::PropertyRef;
use crate::core::value::Value;

/// Comparison operators usable in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Substring for strings, membership for lists
    Contains,
    StartsWith,
    /// Property value is one of the listed values
    In,
}

impl Operator {
    /// Symbol used by the textual request syntax
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Contains => "contains",
            Operator::StartsWith => "startswith",
            Operator::In => "in",
        }
    }

    /// Parse an operator symbol or keyword
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol.to_ascii_lowercase().as_str() {
            "=" | "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "contains" => Operator::Contains,
            "startswith" => Operator::StartsWith,
            "in" => Operator::In,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Leaf of a predicate: `property operator value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub property: PropertyRef,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new<P: Into<PropertyRef>, V: Into<Value>>(property: P, operator: Operator, value: V) -> Self {
        Condition {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Boolean predicate tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// All sub-predicates hold (true when empty)
    And(Vec<Predicate>),
    /// At least one sub-predicate holds (false when empty)
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Condition(Condition),
}

impl Predicate {
    /// Predicate matching every item
    pub fn all() -> Self {
        Predicate::And(Vec::new())
    }

    pub fn condition<P: Into<PropertyRef>, V: Into<Value>>(property: P, operator: Operator, value: V) -> Self {
        Predicate::Condition(Condition::new(property, operator, value))
    }

    pub fn eq<P: Into<PropertyRef>, V: Into<Value>>(property: P, value: V) -> Self {
        Predicate::condition(property, Operator::Eq, value)
    }

    pub fn ne<P: Into<PropertyRef>, V: Into<Value>>(property: P, value: V) -> Self {
        Predicate::condition(property, Operator::Ne, value)
    }

    pub fn lt<P: Into<PropertyRef>, V: Into<Value>>(property: P, value: V) -> Self {
        Predicate::condition(property, Operator::Lt, value)
    }

    pub fn gt<P: Into<PropertyRef>, V: Into<Value>>(property: P, value: V) -> Self {
        Predicate::condition(property, Operator::Gt, value)
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), right) => {
                left.push(right);
                Predicate::And(left)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction of `self` and `other`
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), right) => {
                left.push(right);
                Predicate::Or(left)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    /// Negation of `self`
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Visit every condition, depth first, left to right
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Predicate::And(subs) | Predicate::Or(subs) => {
                for sub in subs {
                    sub.collect_conditions(out);
                }
            }
            Predicate::Not(sub) => sub.collect_conditions(out),
            Predicate::Condition(condition) => out.push(condition),
        }
    }

    /// Rebuild the tree with every condition passed through `f`
    pub fn map_conditions<F>(&self, f: &mut F) -> Predicate
    where
        F: FnMut(&Condition) -> Condition,
    {
        match self {
            Predicate::And(subs) => Predicate::And(subs.iter().map(|s| s.map_conditions(f)).collect()),
            Predicate::Or(subs) => Predicate::Or(subs.iter().map(|s| s.map_conditions(f)).collect()),
            Predicate::Not(sub) => Predicate::Not(Box::new(sub.map_conditions(f))),
            Predicate::Condition(condition) => Predicate::Condition(f(condition)),
        }
    }

    /// Fallible version of `map_conditions`
    pub fn try_map_conditions<F, E>(&self, f: &mut F) -> Result<Predicate, E>
    where
        F: FnMut(&Condition) -> Result<Condition, E>,
    {
        Ok(match self {
            Predicate::And(subs) => Predicate::And(
                subs.iter().map(|s| s.try_map_conditions(f)).collect::<Result<_, _>>()?,
            ),
            Predicate::Or(subs) => Predicate::Or(
                subs.iter().map(|s| s.try_map_conditions(f)).collect::<Result<_, _>>()?,
            ),
            Predicate::Not(sub) => Predicate::Not(Box::new(sub.try_map_conditions(f)?)),
            Predicate::Condition(condition) => Predicate::Condition(f(condition)?),
        })
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::all()
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Condition(condition)
    }
}

/// Format in the textual request syntax
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, subs: &[Predicate], sep: &str, empty: &str) -> fmt::Result {
            if subs.is_empty() {
                return write!(f, "{}", empty);
            }
            write!(f, "(")?;
            for (i, sub) in subs.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", sub)?;
            }
            write!(f, ")")
        }

        match self {
            Predicate::And(subs) => join(f, subs, "and", "true"),
            Predicate::Or(subs) => join(f, subs, "or", "false"),
            Predicate::Not(sub) => write!(f, "not {}", sub),
            Predicate::Condition(c) => write!(f, "{} {} {}", c.property, c.operator, c.value),
        }
    }
}
