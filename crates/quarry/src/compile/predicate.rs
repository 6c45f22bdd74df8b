use crate::{
    compile::CompiledExpr,
    expr::{CompareModifier, CompareOptions},
    predicate::CompareOp,
};
use serde::{Deserialize, Serialize};

///
/// CompiledPredicate
///
/// Engine-native predicate form. Comparisons carry the quantifier inherited
/// from their left operand and the option union of both operands.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompiledPredicate {
    True,
    False,
    Compare {
        lhs: CompiledExpr,
        rhs: CompiledExpr,
        op: CompareOp,
        modifier: CompareModifier,
        options: CompareOptions,
    },
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
    Not(Box<CompiledPredicate>),
}
