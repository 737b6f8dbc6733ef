//! Parser for the textual request syntax
//!
//! This module turns strings such as `age > 30 and not city = "Lyon"`
//! into a `Predicate`.

use pest::Parser;
use pest_derive::Parser;
use pest::iterators::Pair;

use crate::core::errors::{Result, SiteError};
use crate::core::path::PropertyRef;
use crate::core::value::Value;
use crate::request::ast::{Condition, Operator, Predicate};

#[derive(Parser)]
#[grammar = "request/grammar.pest"]
pub struct RequestParser;

/// Parse a textual request into a predicate
pub fn parse_predicate(input: &str) -> Result<Predicate> {
    let mut pairs = RequestParser::parse(Rule::main, input)
        .map_err(|e| SiteError::MalformedRequest(format!("Parse error: {}", e)))?;

    let main = pairs
        .next()
        .ok_or_else(|| SiteError::MalformedRequest("Empty request".to_string()))?;

    let expr = main
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| SiteError::MalformedRequest("Empty request".to_string()))?;

    build_predicate(expr)
}

fn build_predicate(pair: Pair<Rule>) -> Result<Predicate> {
    match pair.as_rule() {
        Rule::expr => {
            let inner = first_inner(pair)?;
            build_predicate(inner)
        }
        Rule::or_expr => {
            let subs = pair
                .into_inner()
                .filter(|p| p.as_rule() == Rule::and_expr)
                .map(build_predicate)
                .collect::<Result<Vec<_>>>()?;
            Ok(collapse(subs, Predicate::Or))
        }
        Rule::and_expr => {
            let subs = pair
                .into_inner()
                .filter(|p| p.as_rule() == Rule::unary)
                .map(build_predicate)
                .collect::<Result<Vec<_>>>()?;
            Ok(collapse(subs, Predicate::And))
        }
        Rule::unary => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| SiteError::MalformedRequest("Empty expression".to_string()))?;
            match first.as_rule() {
                Rule::not_op => {
                    let operand = inner.next().ok_or_else(|| {
                        SiteError::MalformedRequest("'not' without operand".to_string())
                    })?;
                    Ok(build_predicate(operand)?.negate())
                }
                _ => build_predicate(first),
            }
        }
        Rule::condition => build_condition(pair).map(Predicate::Condition),
        rule => Err(SiteError::MalformedRequest(format!(
            "Unexpected rule in request: {:?}",
            rule
        ))),
    }
}

/// A single operand is returned as-is rather than wrapped
fn collapse(mut subs: Vec<Predicate>, wrap: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if subs.len() == 1 {
        subs.remove(0)
    } else {
        wrap(subs)
    }
}

fn build_condition(pair: Pair<Rule>) -> Result<Condition> {
    let mut inner = pair.into_inner();
    let property_pair = inner
        .next()
        .ok_or_else(|| SiteError::MalformedRequest("Missing property".to_string()))?;
    let operator_pair = inner
        .next()
        .ok_or_else(|| SiteError::MalformedRequest("Missing operator".to_string()))?;
    let value_pair = inner
        .next()
        .ok_or_else(|| SiteError::MalformedRequest("Missing value".to_string()))?;

    let property: PropertyRef = property_pair.as_str().parse()?;
    let operator = Operator::from_symbol(operator_pair.as_str()).ok_or_else(|| {
        SiteError::MalformedRequest(format!("Unknown operator: {}", operator_pair.as_str()))
    })?;
    let value = build_literal(value_pair)?;

    Ok(Condition {
        property,
        operator,
        value,
    })
}

fn build_literal(pair: Pair<Rule>) -> Result<Value> {
    match pair.as_rule() {
        Rule::string => {
            let inner = first_inner(pair)?;
            Ok(Value::String(inner.as_str().to_string()))
        }
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| SiteError::MalformedRequest(format!("Invalid integer: {}", e))),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| SiteError::MalformedRequest(format!("Invalid float: {}", e))),
        Rule::boolean => Ok(Value::Boolean(pair.as_str() == "true")),
        Rule::null_lit => Ok(Value::Null),
        Rule::list => {
            let items = pair
                .into_inner()
                .map(build_literal)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(items))
        }
        rule => Err(SiteError::MalformedRequest(format!(
            "Unexpected literal: {:?}",
            rule
        ))),
    }
}

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>> {
    let text = pair.as_str().to_string();
    pair.into_inner()
        .next()
        .ok_or_else(|| SiteError::MalformedRequest(format!("Incomplete expression: {}", text)))
}
