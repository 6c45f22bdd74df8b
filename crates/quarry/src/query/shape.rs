use crate::{
    compile::ShapeKind,
    engine::{DecodeError, KeyedRow, Row},
    error::Error,
    expr::Selection,
    traits::{EntityKind, EntityValue},
    types::Id,
};

///
/// Result shapes
///
/// The phantom state machine tracked by `Request`'s last type parameter.
/// Each shape registers the reconstruction function mapping engine rows to
/// typed results; which builder calls remain available is decided by the
/// shape type, so there is no path back to `Objects` once a request has
/// switched to a keyed or identifier shape.
///

/// Whole entity records.
#[derive(Clone, Copy)]
pub struct Objects;

/// Name-keyed rows with no static projection type.
#[derive(Clone, Copy)]
pub struct Dictionaries;

/// Bare object identities.
#[derive(Clone, Copy)]
pub struct Identifiers;

/// Typed tuple projection; holds the projection list for decoding.
#[derive(Clone)]
pub struct Selected<P>(pub(crate) P);

///
/// Shape
///

pub trait Shape<E> {
    type Output;

    fn decode(&self, row: Row) -> Result<Self::Output, Error>;
}

impl<E: EntityValue> Shape<E> for Objects {
    type Output = E;

    fn decode(&self, row: Row) -> Result<E, Error> {
        match row {
            Row::Object(record) => E::from_record(&record).map_err(Error::Decode),
            _ => Err(DecodeError::ShapeMismatch {
                expected: ShapeKind::Objects,
            }
            .into()),
        }
    }
}

impl<E> Shape<E> for Dictionaries {
    type Output = KeyedRow;

    fn decode(&self, row: Row) -> Result<KeyedRow, Error> {
        match row {
            Row::Keyed(keyed) => Ok(keyed),
            _ => Err(DecodeError::ShapeMismatch {
                expected: ShapeKind::Keyed,
            }
            .into()),
        }
    }
}

impl<E: EntityKind> Shape<E> for Identifiers {
    type Output = Id<E>;

    fn decode(&self, row: Row) -> Result<Id<E>, Error> {
        match row {
            Row::Id(id) => Ok(Id::from_object(id)),
            _ => Err(DecodeError::ShapeMismatch {
                expected: ShapeKind::Ids,
            }
            .into()),
        }
    }
}

impl<E, P: Selection<E>> Shape<E> for Selected<P> {
    type Output = P::Output;

    fn decode(&self, row: Row) -> Result<P::Output, Error> {
        match row {
            Row::Keyed(keyed) => Ok(self.0.decode(&keyed)),
            _ => Err(DecodeError::ShapeMismatch {
                expected: ShapeKind::Keyed,
            }
            .into()),
        }
    }
}
