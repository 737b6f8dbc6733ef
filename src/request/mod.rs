//! Requests for cornfield
//!
//! This module provides the predicate language callers use to say which
//! items they want, and the passes that prepare a predicate for a backend.

pub mod ast;
pub mod parser;
pub mod evaluator;
pub mod alias;
pub mod normalize;

pub use ast::{Condition, Operator, Predicate};
pub use alias::{resolve_aliases, AliasTable, Aliases};
pub use evaluator::PropertyLookup;
pub use normalize::{make_request, normalize, RequestInput};
pub use parser::parse_predicate;
