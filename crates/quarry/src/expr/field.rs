use crate::{
    expr::{Cast, Expr, IntoExpr, join_path},
    predicate::Filter,
    traits::{Comparable, EntityKind, EntityValue, Equatable, FieldValue, Numeric, TextValue},
    types::Id,
};
use std::{borrow::Cow, fmt, marker::PhantomData};

///
/// ToOne / ToMany
///
/// Phantom markers occupying a field's value position when the field is a
/// relationship rather than a scalar. They are never instantiated; they only
/// select which combinators a `Field`/`Expr` exposes.
///

pub struct ToOne<R> {
    _marker: PhantomData<fn() -> R>,
}

pub struct ToMany<R> {
    _marker: PhantomData<fn() -> R>,
}

// To-one references compare by identity.
impl<R> Equatable for ToOne<R> {}

///
/// Field
///
/// Typed path from root entity `E` to a field of type `V`, scalar or
/// relationship-typed. Declared as consts on entity types and composed with
/// `then` across to-one joins.
///

pub struct Field<E, V> {
    path: Cow<'static, str>,
    _marker: PhantomData<fn(&E) -> V>,
}

impl<E, V> Clone for Field<E, V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, V> fmt::Debug for Field<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.path).finish()
    }
}

impl<E, V> Field<E, V> {
    /// Declare a field reference.
    #[must_use]
    pub const fn new(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            _marker: PhantomData,
        }
    }

    pub(crate) const fn from_path(path: String) -> Self {
        Self {
            path: Cow::Owned(path),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// View this field reference as an expression.
    #[must_use]
    pub fn expr(self) -> Expr<E, V> {
        self.into_expr()
    }

    #[must_use]
    pub fn is_null(self) -> Filter<E> {
        self.expr().is_null()
    }

    #[must_use]
    pub fn is_not_null(self) -> Filter<E> {
        self.expr().is_not_null()
    }

    #[must_use]
    pub fn count(self) -> Expr<E, i64> {
        self.expr().count()
    }

    /// Wrap as a named, typed projection.
    #[must_use]
    pub fn cast<T: FieldValue>(self, name: impl Into<String>) -> Cast<E, T> {
        self.expr().cast(name)
    }
}

impl<E, V: Equatable> Field<E, V> {
    #[must_use]
    pub fn eq(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().eq(rhs)
    }

    #[must_use]
    pub fn ne(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().ne(rhs)
    }

    #[must_use]
    pub fn in_iter<I>(self, values: I) -> Filter<E>
    where
        V: FieldValue,
        I: IntoIterator<Item = V>,
    {
        self.expr().in_iter(values)
    }
}

impl<E, V: Comparable> Field<E, V> {
    #[must_use]
    pub fn lt(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().lt(rhs)
    }

    #[must_use]
    pub fn lte(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().lte(rhs)
    }

    #[must_use]
    pub fn gt(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().gt(rhs)
    }

    #[must_use]
    pub fn gte(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().gte(rhs)
    }
}

impl<E, V: Numeric> Field<E, V> {
    #[must_use]
    pub fn sum(self) -> Expr<E, V> {
        self.expr().sum()
    }

    #[must_use]
    pub fn average(self) -> Expr<E, V> {
        self.expr().average()
    }

    #[must_use]
    pub fn min(self) -> Expr<E, V> {
        self.expr().min()
    }

    #[must_use]
    pub fn max(self) -> Expr<E, V> {
        self.expr().max()
    }

    #[must_use]
    pub fn abs(self) -> Expr<E, V> {
        self.expr().abs()
    }
}

impl<E, V: TextValue> Field<E, V> {
    #[must_use]
    pub fn case_insensitive(self) -> Expr<E, V> {
        self.expr().case_insensitive()
    }

    #[must_use]
    pub fn like(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().like(rhs)
    }

    #[must_use]
    pub fn begins_with(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().begins_with(rhs)
    }

    #[must_use]
    pub fn ends_with(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().ends_with(rhs)
    }

    #[must_use]
    pub fn contains(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().contains(rhs)
    }

    #[must_use]
    pub fn matches(self, rhs: impl IntoExpr<E, V>) -> Filter<E> {
        self.expr().matches(rhs)
    }
}

impl<E, M: EntityKind> Field<E, ToOne<M>> {
    /// Extend the path across the to-one join.
    #[must_use]
    pub fn then<V>(self, next: Field<M, V>) -> Field<E, V> {
        Field::from_path(join_path(self.path(), next.path()))
    }
}

impl<E, R: EntityKind> Field<E, ToMany<R>> {
    #[must_use]
    pub fn any<V: FieldValue>(self, child: Field<R, V>) -> Expr<E, V> {
        self.expr().any(child)
    }

    #[must_use]
    pub fn all<V: FieldValue>(self, child: Field<R, V>) -> Expr<E, V> {
        self.expr().all(child)
    }

    #[must_use]
    pub fn count_of<V: FieldValue>(self, child: Field<R, V>) -> Expr<E, i64> {
        self.expr().count_of(child)
    }

    #[must_use]
    pub fn sum_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        self.expr().sum_of(child)
    }

    #[must_use]
    pub fn avg_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        self.expr().avg_of(child)
    }

    #[must_use]
    pub fn min_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        self.expr().min_of(child)
    }

    #[must_use]
    pub fn max_of<V: Numeric>(self, child: Field<R, V>) -> Expr<E, V> {
        self.expr().max_of(child)
    }

    #[must_use]
    pub fn contains_entity(self, entity: &R) -> Filter<E>
    where
        R: EntityValue,
    {
        self.expr().contains_entity(entity)
    }

    #[must_use]
    pub fn contains_id(self, id: Id<R>) -> Filter<E> {
        self.expr().contains_id(id)
    }

    #[must_use]
    pub fn subquery(self, predicate: Filter<R>) -> Expr<E, ToMany<R>> {
        self.expr().subquery(predicate)
    }
}
