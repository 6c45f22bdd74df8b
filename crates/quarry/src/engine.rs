//! Boundary with the external persistence engine.
//!
//! The core never executes anything itself: compiled descriptors are handed
//! to an `Engine`, and batch mutations are followed by a mandatory cache
//! reconciliation step through the engine's `IdentityCache` hook.

use crate::{
    compile::{CompiledPredicate, QueryDescriptor, ShapeKind},
    types::ObjectId,
    value::{TypeTag, Value},
};
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// Record
///
/// A whole stored object as the engine returns it: identity plus field map.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: ObjectId,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

///
/// KeyedRow
///
/// Name-keyed row returned for projected/grouped queries.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, IntoIterator, PartialEq, Serialize, Deserialize,
)]
pub struct KeyedRow(pub BTreeMap<String, Value>);

///
/// Row
///
/// One result row in whichever shape the descriptor requested.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Row {
    Object(Record),
    Keyed(KeyedRow),
    Id(ObjectId),
    Count(u64),
}

///
/// EngineError
///
/// Execution failure surfaced verbatim from the engine; the core does not
/// retry.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EngineError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("unknown field '{path}' on entity '{entity}'")]
    UnknownField { entity: String, path: String },

    #[error("unsupported descriptor feature: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Internal(String),
}

///
/// ReconcileError
///
/// Failure while merging a committed batch mutation into the engine's local
/// object cache. Persisted and cached state may diverge at this point, so
/// these are never swallowed.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ReconcileError {
    #[error("identity {id} is stale in the local cache")]
    StaleIdentity { id: ObjectId },

    #[error("local cache unavailable: {0}")]
    CacheUnavailable(String),
}

///
/// DecodeError
///
/// Failure mapping an engine row back into a typed result.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DecodeError {
    #[error("row shape mismatch: expected {expected:?}")]
    ShapeMismatch { expected: ShapeKind },

    #[error("record is missing field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' does not decode as {tag:?}")]
    FieldType { field: String, tag: TypeTag },
}

///
/// Engine
///
/// The persistence collaborator. Implementations accept a declarative
/// descriptor and perform selection, sorting, grouping, and batch mutation;
/// the calling thread blocks until the engine responds.
///

pub trait Engine {
    /// Execute a compiled descriptor and return rows in result order.
    fn fetch_rows(&self, descriptor: &QueryDescriptor) -> Result<Vec<Row>, EngineError>;

    /// Delete every row of `entity` matching `predicate`; return the removed
    /// identities. Deleting zero rows is success.
    fn execute_batch_delete(
        &self,
        entity: &str,
        predicate: Option<&CompiledPredicate>,
    ) -> Result<Vec<ObjectId>, EngineError>;

    /// Assign `assignments` on every row of `entity` matching `predicate`;
    /// return the updated identities.
    fn execute_batch_update(
        &self,
        entity: &str,
        predicate: Option<&CompiledPredicate>,
        assignments: &BTreeMap<String, Value>,
    ) -> Result<Vec<ObjectId>, EngineError>;

    /// Resolve the declared type tag of a field path, when the engine's
    /// schema knows it. Callers fall back to the static tag table otherwise.
    fn resolve_field_metadata(&self, entity: &str, path: &str) -> Option<TypeTag>;
}

///
/// IdentityCache
///
/// Post-commit hook interface for the engine's in-memory object cache.
/// Batch mutations bypass normal object lifecycle tracking, so the core
/// calls these after every successful batch operation.
///

pub trait IdentityCache {
    /// Mark cached entries for `ids` as removed.
    fn merge_deletions(&self, entity: &str, ids: &[ObjectId]) -> Result<(), ReconcileError>;

    /// Apply `assignments` to cached entries for `ids` still resident in
    /// memory.
    fn merge_updates(
        &self,
        entity: &str,
        ids: &[ObjectId],
        assignments: &BTreeMap<String, Value>,
    ) -> Result<(), ReconcileError>;
}
