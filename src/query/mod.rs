//! Query chains
//!
//! A view call is turned into a chain of operators, checked against the
//! access point's schema, then handed to the backend. Backends without
//! their own engine can run the chain with `executor::execute`.

pub mod ops;
pub mod builder;
pub mod validate;
pub mod executor;

pub use ops::{AggregateFn, AggregateSpec, Aggregation, OrderKey, QueryChain, QueryOp, SelectRange};
pub use builder::ViewRequest;
pub use executor::{execute, RowIter};
