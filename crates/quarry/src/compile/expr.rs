use crate::{compile::CompiledPredicate, value::Value};
use serde::{Deserialize, Serialize};

///
/// CompiledExpr
///
/// Engine-native expression form, fully resolved against its operand
/// context: key paths are rooted or bound to a named subquery variable, and
/// function names are opaque identifiers the engine interprets.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompiledExpr {
    Constant(Value),
    /// Dotted field path resolved against the root entity.
    KeyPath(String),
    /// Dotted field path resolved against a subquery iteration variable.
    Variable { name: String, path: String },
    /// The evaluated object itself.
    SelfRef,
    /// Path traversal on a computed base (e.g. into a filtered collection).
    Member {
        base: Box<CompiledExpr>,
        path: String,
    },
    Function {
        name: String,
        args: Vec<CompiledExpr>,
    },
    /// Bound-variable filtered collection.
    Subquery {
        collection: Box<CompiledExpr>,
        variable: String,
        predicate: Box<CompiledPredicate>,
    },
}
