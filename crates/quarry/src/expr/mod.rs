//! Expression algebra: typed, side-effect-free trees describing how to
//! compute a value relative to an evaluation context. Nothing here executes;
//! nodes only resolve into the portable compiled form.

mod cast;
mod field;
mod typed;


use crate::{compile::CompiledExpr, predicate::PredicateNode, value::Value};
use serde::{Deserialize, Serialize};

// re-exports
pub use cast::{Cast, Property, Selection, TypedProperty};
pub use field::{Field, ToMany, ToOne};
pub use typed::{Expr, IntoExpr, this};

/// Iteration variable bound by subquery expressions.
pub(crate) const SUBQUERY_VARIABLE: &str = "x";

///
/// Operand
///
/// Evaluation context a field reference resolves against: the root entity,
/// or a named iteration variable inside a subquery predicate.
///
/// The context is always passed explicitly through resolution; two
/// independent subqueries can never observe each other's variable.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Root,
    Variable(String),
}

///
/// CompareModifier
///
/// Quantifier a comparison inherits from its left operand: `Any`/`All` for
/// to-many aggregates, `Direct` otherwise.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CompareModifier {
    #[default]
    Direct,
    Any,
    All,
}

///
/// CompareOptions
///
/// Comparison options unioned from both operands when a comparison compiles.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompareOptions {
    pub case_insensitive: bool,
}

impl CompareOptions {
    pub(crate) const CASE_INSENSITIVE: Self = Self {
        case_insensitive: true,
    };

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            case_insensitive: self.case_insensitive || other.case_insensitive,
        }
    }
}

///
/// ExprNode
///
/// Untyped expression kernel. Typed wrappers (`Expr`, `Field`, `Cast`)
/// guarantee well-kindedness at construction; the kernel only knows how to
/// derive comparison metadata and resolve itself against an operand.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ExprNode {
    Constant(Value),
    Null,
    KeyPath(String),
    SelfRef,
    Aggregate {
        base: Box<ExprNode>,
        child: String,
        modifier: CompareModifier,
    },
    Function {
        name: &'static str,
        args: Vec<ExprNode>,
    },
    CaseInsensitive(Box<ExprNode>),
    Subquery {
        base: Box<ExprNode>,
        variable: String,
        predicate: Box<PredicateNode>,
    },
}

impl ExprNode {
    /// Comparison quantifier this expression contributes when used as the
    /// left operand of a comparison.
    pub(crate) fn modifier(&self) -> CompareModifier {
        match self {
            Self::Aggregate { modifier, .. } => *modifier,
            Self::CaseInsensitive(base) => base.modifier(),
            _ => CompareModifier::Direct,
        }
    }

    /// Comparison options contributed by this expression; functions inherit
    /// from their first argument, wraps from their base.
    pub(crate) fn options(&self) -> CompareOptions {
        match self {
            Self::CaseInsensitive(base) => base.options().union(CompareOptions::CASE_INSENSITIVE),
            Self::Aggregate { base, .. } => base.options(),
            Self::Function { args, .. } => args.first().map_or_else(CompareOptions::default, Self::options),
            _ => CompareOptions::default(),
        }
    }

    /// Resolve into the portable compiled form against an operand context.
    ///
    /// Subquery predicates resolve against the subquery's iteration variable;
    /// everything else keeps the caller's context.
    pub(crate) fn resolve(&self, operand: &Operand) -> CompiledExpr {
        match self {
            Self::Constant(value) => CompiledExpr::Constant(value.clone()),
            Self::Null => CompiledExpr::Constant(Value::Null),
            Self::KeyPath(path) => match operand {
                Operand::Root => CompiledExpr::KeyPath(path.clone()),
                Operand::Variable(name) => CompiledExpr::Variable {
                    name: name.clone(),
                    path: path.clone(),
                },
            },
            Self::SelfRef => CompiledExpr::SelfRef,
            Self::Aggregate { base, child, .. } => match base.resolve(operand) {
                CompiledExpr::KeyPath(path) => CompiledExpr::KeyPath(join_path(&path, child)),
                CompiledExpr::Variable { name, path } => CompiledExpr::Variable {
                    name,
                    path: join_path(&path, child),
                },
                other => CompiledExpr::Member {
                    base: Box::new(other),
                    path: child.clone(),
                },
            },
            Self::Function { name, args } => CompiledExpr::Function {
                name: (*name).to_string(),
                args: args.iter().map(|arg| arg.resolve(operand)).collect(),
            },
            Self::CaseInsensitive(base) => base.resolve(operand),
            Self::Subquery {
                base,
                variable,
                predicate,
            } => CompiledExpr::Subquery {
                collection: Box::new(base.resolve(operand)),
                variable: variable.clone(),
                predicate: Box::new(predicate.resolve(&Operand::Variable(variable.clone()))),
            },
        }
    }
}

pub(crate) fn join_path(base: &str, child: &str) -> String {
    format!("{base}.{child}")
}
