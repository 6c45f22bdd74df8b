use crate::{
    compile::StateError,
    engine::{DecodeError, EngineError, ReconcileError},
    query::ResponseError,
    types::ObjectId,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Everything an executing operation can surface. Construction-time type
/// mismatches have no variant here: the expression algebra makes them
/// unrepresentable.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    /// Descriptor state sequencing rejected at compile time.
    #[error("invalid query state: {0}")]
    State(#[from] StateError),

    /// The engine rejected the compiled descriptor or failed executing it.
    #[error("query execution failed: {0}")]
    Execution(#[from] EngineError),

    /// A returned row could not be mapped into the requested shape.
    #[error("row decoding failed: {0}")]
    Decode(#[from] DecodeError),

    /// Result cardinality did not match what the terminal required.
    #[error("{0}")]
    Response(#[from] ResponseError),

    /// A batch mutation committed at the engine, but merging it into the
    /// local cache failed. Persisted and cached state have diverged for the
    /// listed identities.
    #[error("batch mutation applied to {} rows but cache reconciliation failed: {source}", applied.len())]
    PartialReconciliation {
        applied: Vec<ObjectId>,
        source: ReconcileError,
    },
}
