use crate::{
    expr::{
        Cast, CompareModifier, ExprNode, Field, SUBQUERY_VARIABLE, ToMany, ToOne, join_path,
    },
    predicate::{CompareOp, Filter},
    traits::{Comparable, EntityKind, EntityValue, Equatable, FieldValue, Numeric, TextValue},
    types::Id,
    value::Value,
};
use std::{
    fmt,
    marker::PhantomData,
    ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Not, Rem, Sub},
};

///
/// Expr
///
/// Typed expression over root entity `E` producing a value of type `V`.
///
/// Which combinators exist is decided by `V`'s capability markers, so an
/// ill-kinded expression (numeric arithmetic on text, string matching on a
/// number) does not construct.
///

pub struct Expr<E, V> {
    pub(crate) node: ExprNode,
    _marker: PhantomData<fn(&E) -> V>,
}

impl<E, V> Clone for Expr<E, V> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<E, V> fmt::Debug for Expr<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

///
/// IntoExpr
///
/// Anything usable as an expression operand of value type `V`: expressions
/// themselves, typed field references, named projections, and raw literals
/// (auto-wrapped into constants).
///

pub trait IntoExpr<E, V> {
    fn into_expr(self) -> Expr<E, V>;
}

impl<E, V> IntoExpr<E, V> for Expr<E, V> {
    fn into_expr(self) -> Self {
        self
    }
}

impl<E, V> IntoExpr<E, V> for Field<E, V> {
    fn into_expr(self) -> Expr<E, V> {
        Expr::from_node(ExprNode::KeyPath(self.path().to_string()))
    }
}

impl<E, T: FieldValue> IntoExpr<E, T> for Cast<E, T> {
    fn into_expr(self) -> Expr<E, T> {
        Expr::from_node(self.into_node())
    }
}

impl<E, V: FieldValue> IntoExpr<E, V> for V {
    fn into_expr(self) -> Expr<E, V> {
        Expr::from_node(ExprNode::Constant(self.to_value()))
    }
}

impl<E> IntoExpr<E, String> for &str {
    fn into_expr(self) -> Expr<E, String> {
        Expr::from_node(ExprNode::Constant(Value::from(self)))
    }
}

impl<E, M: EntityValue> IntoExpr<E, ToOne<M>> for &M {
    fn into_expr(self) -> Expr<E, ToOne<M>> {
        Expr::from_node(ExprNode::Constant(Value::Id(self.id().object())))
    }
}

impl<E, M: EntityKind> IntoExpr<E, ToOne<M>> for Id<M> {
    fn into_expr(self) -> Expr<E, ToOne<M>> {
        Expr::from_node(ExprNode::Constant(Value::Id(self.object())))
    }
}

/// Expression evaluating to the root object itself.
///
/// Comparable against an entity or a typed identity, and castable to an
/// object-identity projection.
#[must_use]
pub fn this<E: EntityKind>() -> Expr<E, ToOne<E>> {
    Expr::from_node(ExprNode::SelfRef)
}

impl<E, V> Expr<E, V> {
    pub(crate) const fn from_node(node: ExprNode) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_node(self) -> ExprNode {
        self.node
    }

    /// Wrap a literal into a constant expression.
    #[must_use]
    pub fn constant(value: V) -> Self
    where
        V: FieldValue,
    {
        Self::from_node(ExprNode::Constant(value.to_value()))
    }

    /// Null-comparison predicate (`field == NULL`).
    #[must_use]
    pub fn is_null(self) -> Filter<E> {
        Filter::compare(self.node, ExprNode::Null, CompareOp::Eq)
    }

    /// Null-comparison predicate (`field != NULL`).
    #[must_use]
    pub fn is_not_null(self) -> Filter<E> {
        Filter::compare(self.node, ExprNode::Null, CompareOp::Ne)
    }

    /// Count of the value (collection cardinality for to-many expressions).
    #[must_use]
    pub fn count(self) -> Expr<E, i64> {
        Expr::from_node(ExprNode::Function {
            name: "count",
            args: vec![self.node],
        })
    }

    /// Wrap as a named, typed projection carrying `T`'s engine type tag.
    #[must_use]
    pub fn cast<T: FieldValue>(self, name: impl Into<String>) -> Cast<E, T> {
        Cast::new(self.node, name.into())
    }
}

impl<E, V: Equatable> Expr<E, V> {
    fn compare(self, rhs: Expr<E, V>, op: CompareOp) -> Filter<E> {
        Filter::compare(self.node, rhs.node, op)
    }

    #[must_use]
    pub fn eq(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Eq)
    }

    #[must_use]
    pub fn ne(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Ne)
    }

    /// Membership in a literal collection.
    #[must_use]
    pub fn in_iter<I>(self, values: I) -> Filter<E>
    where
        V: FieldValue,
        I: IntoIterator<Item = V>,
    {
        Filter::compare(
            self.node,
            ExprNode::Constant(Value::list(values)),
            CompareOp::In,
        )
    }
}

impl<E, V: Comparable> Expr<E, V> {
    #[must_use]
    pub fn lt(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Lt)
    }

    #[must_use]
    pub fn lte(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Lte)
    }

    #[must_use]
    pub fn gt(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Gt)
    }

    #[must_use]
    pub fn gte(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Gte)
    }
}

impl<E, V: Numeric> Expr<E, V> {
    fn unary(self, name: &'static str) -> Self {
        Self::from_node(ExprNode::Function {
            name,
            args: vec![self.node],
        })
    }

    pub(crate) fn binary(self, name: &'static str, rhs: Self) -> Self {
        Self::from_node(ExprNode::Function {
            name,
            args: vec![self.node, rhs.node],
        })
    }

    /// Aggregate sum (meaningful under grouping).
    #[must_use]
    pub fn sum(self) -> Self {
        self.unary("sum")
    }

    /// Aggregate average (meaningful under grouping).
    #[must_use]
    pub fn average(self) -> Self {
        self.unary("average")
    }

    /// Aggregate minimum (meaningful under grouping).
    #[must_use]
    pub fn min(self) -> Self {
        self.unary("min")
    }

    /// Aggregate maximum (meaningful under grouping).
    #[must_use]
    pub fn max(self) -> Self {
        self.unary("max")
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        self.unary("abs")
    }
}

impl<E, V: TextValue> Expr<E, V> {
    /// Case-insensitive comparison wrapper; the option is consumed when the
    /// enclosing comparison compiles.
    #[must_use]
    pub fn case_insensitive(self) -> Self {
        Self::from_node(ExprNode::CaseInsensitive(Box::new(self.node)))
    }

    #[must_use]
    pub fn like(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Like)
    }

    #[must_use]
    pub fn begins_with(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::StartsWith)
    }

    #[must_use]
    pub fn ends_with(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::EndsWith)
    }

    #[must_use]
    pub fn contains(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Contains)
    }

    /// Regular-expression match; the pattern dialect is the engine's.
    #[must_use]
    pub fn matches(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.compare(rhs.into_expr(), CompareOp::Matches)
    }
}

impl<E, R: EntityKind> Expr<E, ToMany<R>> {
    fn aggregate<V>(self, child: &Field<R, V>, modifier: CompareModifier) -> ExprNode {
        ExprNode::Aggregate {
            base: Box::new(self.node),
            child: child.path().to_string(),
            modifier,
        }
    }

    fn aggregate_fn<V>(self, name: &'static str, child: &Field<R, V>) -> ExprNode {
        let direct = self.aggregate(child, CompareModifier::Direct);

        ExprNode::Function {
            name,
            args: vec![direct],
        }
    }

    /// Traverse the to-many relationship; the enclosing comparison holds when
    /// any element satisfies it.
    #[must_use]
    pub fn any<V: FieldValue>(self, child: Field<R, V>) -> Expr<E, V> {
        let node = self.aggregate(&child, CompareModifier::Any);
        Expr::from_node(node)
    }

    /// Traverse the to-many relationship; the enclosing comparison holds only
    /// when every element satisfies it.
    #[must_use]
    pub fn all<V: FieldValue>(self, child: Field<R, V>) -> Expr<E, V> {
        let node = self.aggregate(&child, CompareModifier::All);
        Expr::from_node(node)
    }

    /// Count of related values.
    #[must_use]
    pub fn count_of<V: FieldValue>(self, child: Field<R, V>) -> Expr<E, i64> {
        Expr::from_node(self.aggregate_fn("count", &child))
    }

    /// Sum over related values.
    #[must_use]
    pub fn sum_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        Expr::from_node(self.aggregate_fn("sum", &child))
    }

    /// Average over related values.
    #[must_use]
    pub fn avg_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        Expr::from_node(self.aggregate_fn("average", &child))
    }

    /// Minimum over related values.
    #[must_use]
    pub fn min_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        Expr::from_node(self.aggregate_fn("min", &child))
    }

    /// Maximum over related values.
    #[must_use]
    pub fn max_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        Expr::from_node(self.aggregate_fn("max", &child))
    }

    /// Collection-membership predicate for an entity.
    #[must_use]
    pub fn contains_entity(self, entity: &R) -> Filter<E>
    where
        R: EntityValue,
    {
        self.contains_id(entity.id())
    }

    /// Collection-membership predicate for a typed identity.
    #[must_use]
    pub fn contains_id(self, id: Id<R>) -> Filter<E> {
        Filter::compare(
            ExprNode::Constant(Value::Id(id.object())),
            self.node,
            CompareOp::In,
        )
    }

    /// Filter the collection with a bound-variable subquery.
    ///
    /// Field references inside `predicate` resolve against the subquery's
    /// iteration variable, not the outer root.
    #[must_use]
    pub fn subquery(self, predicate: Filter<R>) -> Self {
        Self::from_node(ExprNode::Subquery {
            base: Box::new(self.node),
            variable: SUBQUERY_VARIABLE.to_string(),
            predicate: Box::new(predicate.into_node()),
        })
    }
}

impl<E, M: EntityKind> Expr<E, ToOne<M>> {
    /// Extend the traversal into the referenced entity.
    #[must_use]
    pub fn then<V>(self, next: Field<M, V>) -> Expr<E, V> {
        match self.node {
            ExprNode::KeyPath(path) => {
                Expr::from_node(ExprNode::KeyPath(join_path(&path, next.path())))
            }
            node => Expr::from_node(ExprNode::Aggregate {
                base: Box::new(node),
                child: next.path().to_string(),
                modifier: CompareModifier::Direct,
            }),
        }
    }
}

// Arithmetic and bitwise combinators; names stay opaque identifiers the
// engine interprets.
macro_rules! numeric_binary_op {
    ($( $trait:ident :: $method:ident => $name:literal ),* $(,)?) => {
        $(
            impl<E, V: Numeric, R: IntoExpr<E, V>> $trait<R> for Expr<E, V> {
                type Output = Self;

                fn $method(self, rhs: R) -> Self {
                    self.binary($name, rhs.into_expr())
                }
            }

            impl<E, V: Numeric, R: IntoExpr<E, V>> $trait<R> for Field<E, V> {
                type Output = Expr<E, V>;

                fn $method(self, rhs: R) -> Expr<E, V> {
                    self.into_expr().binary($name, rhs.into_expr())
                }
            }
        )*
    };
}

numeric_binary_op! {
    Add::add => "add",
    Sub::sub => "subtract",
    Mul::mul => "multiply",
    Div::div => "divide",
    Rem::rem => "modulus",
    BitAnd::bitand => "bitwise_and",
    BitOr::bitor => "bitwise_or",
    BitXor::bitxor => "bitwise_xor",
}

impl<E, V: Numeric> Not for Expr<E, V> {
    type Output = Self;

    fn not(self) -> Self {
        self.unary("ones_complement")
    }
}

impl<E, V: Numeric> Not for Field<E, V> {
    type Output = Expr<E, V>;

    fn not(self) -> Expr<E, V> {
        !self.into_expr()
    }
}
