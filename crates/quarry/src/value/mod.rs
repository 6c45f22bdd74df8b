mod compare;
mod tag;


use crate::{
    traits::FieldValue,
    types::{ObjectId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// re-exports
pub use compare::sort_cmp;
pub use tag::TypeTag;

///
/// Value
///
/// The storable value universe carried by constants, records, and keyed rows.
///
/// Null → the field's value is absent (SQL NULL).
/// List → ordered many-cardinality transport; order is preserved.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(Timestamp),
    Bytes(Vec<u8>),
    Id(ObjectId),
    List(Vec<Self>),
    Null,
}

impl Value {
    ///
    /// CONSTRUCTION
    ///

    /// Build a `Value::List` from typed scalars.
    pub fn list<T, I>(values: I) -> Self
    where
        T: FieldValue,
        I: IntoIterator<Item = T>,
    {
        Self::List(values.into_iter().map(FieldValue::to_value).collect())
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view used for cross-family comparison and arithmetic.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_id(&self) -> Option<ObjectId> {
        match self {
            Self::Id(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    ///
    /// ORDERING
    ///

    /// Total sort order over all values; see `compare::sort_cmp`.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        compare::sort_cmp(self, other)
    }

    /// Equality under the sort order (`Int(2)` equals `Float(2.0)`).
    #[must_use]
    pub fn sort_eq(&self, other: &Self) -> bool {
        self.sort_cmp(other) == Ordering::Equal
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}
