//! Quarry: a compile-time-checked expression and predicate builder.
//!
//! Typed fluent queries against an object graph compile into a portable
//! `QueryDescriptor` (filter, sort, grouping, projection, window) executed
//! by an external persistence engine behind the `Engine` boundary. The
//! builder tracks result shape in the type system: projecting or grouping a
//! request permanently switches it to a keyed shape.
#![warn(unreachable_pub)]

pub mod compile;
pub mod engine;
pub mod error;
pub mod expr;
pub mod predicate;
pub mod query;
pub mod traits;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary only; errors and engine plumbing stay behind their
/// modules.
///

pub mod prelude {
    pub use crate::{
        expr::{Cast, Expr, Field, ToMany, ToOne, this},
        predicate::Filter,
        query::{Request, Session},
        traits::{EntityKind, EntityValue, FieldValue},
        types::{Id, ObjectId, Timestamp},
        value::Value,
    };
}
