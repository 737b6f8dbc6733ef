//! Request normalization
//!
//! Callers may hand over a request in several shapes. `make_request`
//! turns any of them into a `Predicate`; `normalize` additionally checks
//! it against an access point's schema and coerces condition values to
//! the declared property types.

use std::collections::BTreeMap;

use crate::core::errors::{Result, SiteError};
use crate::core::item::Item;
use crate::core::path::PropertyRef;
use crate::core::schema::{PropertyKind, Schema};
use crate::core::value::Value;
use crate::request::ast::{Condition, Operator, Predicate};
use crate::request::parser::parse_predicate;

/// Raw request as supplied by a caller
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestInput {
    /// Matches every item
    #[default]
    Everything,
    /// Already-built predicate
    Predicate(Predicate),
    /// `{property: value}` shorthand, an implicit conjunction of equalities
    Literal(BTreeMap<String, Value>),
    /// JSON object with the same meaning as `Literal`
    Json(serde_json::Value),
    /// Textual request syntax
    Text(String),
}

impl From<Predicate> for RequestInput {
    fn from(predicate: Predicate) -> Self {
        RequestInput::Predicate(predicate)
    }
}

impl From<Condition> for RequestInput {
    fn from(condition: Condition) -> Self {
        RequestInput::Predicate(Predicate::Condition(condition))
    }
}

impl From<Item> for RequestInput {
    fn from(literal: Item) -> Self {
        RequestInput::Literal(literal)
    }
}

impl From<serde_json::Value> for RequestInput {
    fn from(json: serde_json::Value) -> Self {
        RequestInput::Json(json)
    }
}

impl From<&str> for RequestInput {
    fn from(text: &str) -> Self {
        RequestInput::Text(text.to_string())
    }
}

impl From<String> for RequestInput {
    fn from(text: String) -> Self {
        RequestInput::Text(text)
    }
}

impl<T: Into<RequestInput>> From<Option<T>> for RequestInput {
    fn from(request: Option<T>) -> Self {
        request.map(Into::into).unwrap_or_default()
    }
}

/// Build a predicate from any supported request shape
pub fn make_request(input: RequestInput) -> Result<Predicate> {
    match input {
        RequestInput::Everything => Ok(Predicate::all()),
        RequestInput::Predicate(predicate) => Ok(predicate),
        RequestInput::Literal(literal) => literal_to_predicate(literal),
        RequestInput::Json(serde_json::Value::Null) => Ok(Predicate::all()),
        RequestInput::Json(serde_json::Value::Object(map)) => {
            let literal = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
            literal_to_predicate(literal)
        }
        RequestInput::Json(other) => Err(SiteError::MalformedRequest(format!(
            "expected a JSON object of property values, got {}",
            other
        ))),
        RequestInput::Text(text) if text.trim().is_empty() => Ok(Predicate::all()),
        RequestInput::Text(text) => parse_predicate(&text),
    }
}

fn literal_to_predicate(literal: BTreeMap<String, Value>) -> Result<Predicate> {
    let conditions = literal
        .into_iter()
        .map(|(path, value)| {
            let property: PropertyRef = path.parse().map_err(|_| {
                SiteError::MalformedRequest(format!("invalid property path {:?}", path))
            })?;
            Ok(Predicate::Condition(Condition {
                property,
                operator: Operator::Eq,
                value,
            }))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Predicate::And(conditions))
}

/// Build a predicate and check it against `schema`.
///
/// Every condition path must resolve; values are coerced to the declared
/// kind of their property (each element for `in`).
pub fn normalize(schema: &Schema, input: RequestInput) -> Result<Predicate> {
    let predicate = make_request(input)?;
    predicate.try_map_conditions(&mut |condition: &Condition| -> Result<Condition> {
        let property = schema.resolve(&condition.property)?;
        let value = coerce_condition_value(&property.kind, condition.operator, condition.value.clone())
            .map_err(|reason| SiteError::schema(&condition.property, reason))?;
        Ok(Condition {
            property: condition.property.clone(),
            operator: condition.operator,
            value,
        })
    })
}

fn coerce_condition_value(
    kind: &PropertyKind,
    operator: Operator,
    value: Value,
) -> std::result::Result<Value, String> {
    match (operator, kind, value) {
        (Operator::In, _, Value::List(items)) => items
            .into_iter()
            .map(|v| kind.coerce(v))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List),
        (Operator::In, _, other) => Err(format!("'in' expects a list, got {}", other.type_name())),
        // Membership test on a list property: coerce nothing
        (Operator::Contains, PropertyKind::List, v) => Ok(v),
        (Operator::Contains | Operator::StartsWith, _, v @ Value::String(_)) => Ok(v),
        (_, _, v) => kind.coerce(v),
    }
}
