//! Predicate algebra: boolean-valued trees over expressions.
//!
//! Predicates are pure values; trees are reused and recombined freely since
//! nodes are immutable. Interpretation happens only when a predicate resolves
//! into the portable compiled form for a given operand context.


use crate::{
    compile::CompiledPredicate,
    expr::{ExprNode, Operand},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    marker::PhantomData,
    ops::{BitAnd, BitOr, Not},
};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Like,
    StartsWith,
    EndsWith,
    Contains,
    Matches,
}

///
/// PredicateNode
///
/// Untyped predicate kernel. `And`/`Or` are n-ary and flattened on
/// construction, so any construction order of a conjunction chain produces
/// the same tree.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PredicateNode {
    True,
    False,
    Compare {
        lhs: ExprNode,
        rhs: ExprNode,
        op: CompareOp,
    },
    And(Vec<PredicateNode>),
    Or(Vec<PredicateNode>),
    Not(Box<PredicateNode>),
}

impl PredicateNode {
    pub(crate) fn and(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::And(mut lhs), Self::And(inner)) => {
                lhs.extend(inner);
                Self::And(lhs)
            }
            (Self::And(mut lhs), other) => {
                lhs.push(other);
                Self::And(lhs)
            }
            (lhs, Self::And(inner)) => {
                let mut nodes = vec![lhs];
                nodes.extend(inner);
                Self::And(nodes)
            }
            (lhs, rhs) => Self::And(vec![lhs, rhs]),
        }
    }

    pub(crate) fn or(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Or(mut lhs), Self::Or(inner)) => {
                lhs.extend(inner);
                Self::Or(lhs)
            }
            (Self::Or(mut lhs), other) => {
                lhs.push(other);
                Self::Or(lhs)
            }
            (lhs, Self::Or(inner)) => {
                let mut nodes = vec![lhs];
                nodes.extend(inner);
                Self::Or(nodes)
            }
            (lhs, rhs) => Self::Or(vec![lhs, rhs]),
        }
    }

    /// Resolve into the portable compiled form.
    ///
    /// Children resolve with the caller's operand context; only subquery
    /// expressions swap in their iteration variable (handled during
    /// expression resolution). A compiled comparison takes its quantifier
    /// from the left operand and the union of both operands' options.
    pub(crate) fn resolve(&self, operand: &Operand) -> CompiledPredicate {
        match self {
            Self::True => CompiledPredicate::True,
            Self::False => CompiledPredicate::False,
            Self::Compare { lhs, rhs, op } => CompiledPredicate::Compare {
                modifier: lhs.modifier(),
                options: lhs.options().union(rhs.options()),
                lhs: lhs.resolve(operand),
                rhs: rhs.resolve(operand),
                op: *op,
            },
            Self::And(nodes) => {
                CompiledPredicate::And(nodes.iter().map(|n| n.resolve(operand)).collect())
            }
            Self::Or(nodes) => {
                CompiledPredicate::Or(nodes.iter().map(|n| n.resolve(operand)).collect())
            }
            Self::Not(inner) => CompiledPredicate::Not(Box::new(inner.resolve(operand))),
        }
    }
}

///
/// Filter
///
/// Typed predicate over root entity `E`. Combine with `&`, `|`, and `!`.
///

pub struct Filter<E> {
    node: PredicateNode,
    _marker: PhantomData<fn(&E)>,
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<E> PartialEq for Filter<E> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<E> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.node).finish()
    }
}

impl<E> Filter<E> {
    pub(crate) const fn from_node(node: PredicateNode) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_node(self) -> PredicateNode {
        self.node
    }

    pub(crate) const fn node(&self) -> &PredicateNode {
        &self.node
    }

    /// Vacuously true predicate.
    #[must_use]
    pub const fn always() -> Self {
        Self::from_node(PredicateNode::True)
    }

    /// Vacuously false predicate.
    #[must_use]
    pub const fn never() -> Self {
        Self::from_node(PredicateNode::False)
    }

    pub(crate) const fn compare(lhs: ExprNode, rhs: ExprNode, op: CompareOp) -> Self {
        Self::from_node(PredicateNode::Compare { lhs, rhs, op })
    }

    /// Resolve into the portable compiled form against an operand context.
    #[must_use]
    pub fn resolve(&self, operand: &Operand) -> CompiledPredicate {
        self.node.resolve(operand)
    }
}

impl<E> BitAnd for Filter<E> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::from_node(self.node.and(rhs.node))
    }
}

impl<E> BitOr for Filter<E> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::from_node(self.node.or(rhs.node))
    }
}

impl<E> Not for Filter<E> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_node(PredicateNode::Not(Box::new(self.node)))
    }
}
