//! Portable compiled query representation.
//!
//! Everything here is plain, serde-serializable data: the engine-native form
//! a request builder compiles into. No execution semantics live in this
//! layer.

mod expr;
mod predicate;


use crate::value::TypeTag;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

// re-exports
pub use expr::CompiledExpr;
pub use predicate::CompiledPredicate;

///
/// ShapeKind
///
/// Result-shape discriminator carried by a compiled descriptor.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Whole entity records.
    Objects,
    /// Name-keyed rows (projection and/or grouping applied).
    Keyed,
    /// Bare object identities.
    Ids,
    /// Scalar row count.
    Count,
}

///
/// SortKey
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub path: String,
    pub ascending: bool,
}

///
/// Window
///
/// Paging window; a later `subrange`/`limit` call replaces the whole window.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub offset: u32,
    pub length: u32,
}

///
/// PropertySpec
///
/// One projected or grouping column: result name, root-resolved expression,
/// and the engine type tag from the fixed lookup table.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub expr: CompiledExpr,
    pub tag: TypeTag,
}

///
/// QueryDescriptor
///
/// The engine-native query form. Produced by `Request::compile` as a pure
/// function of accumulated state: repeatable and side-effect-free.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub entity: String,
    pub shape: ShapeKind,
    pub predicate: Option<CompiledPredicate>,
    pub having: Option<CompiledPredicate>,
    pub sort: Vec<SortKey>,
    pub properties: Vec<PropertySpec>,
    pub group_by: Vec<PropertySpec>,
    pub window: Option<Window>,
}

///
/// StateError
///
/// Descriptor state-sequencing violations, rejected when the descriptor
/// compiles, before anything reaches the engine.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StateError {
    #[error("having(..) requires at least one group_by(..) field")]
    HavingWithoutGroup,

    #[error("update target '{field}' crosses a relationship; batch updates assign direct fields only")]
    UpdateAcrossRelationship { field: String },
}
