use crate::{
    traits::EntityKind,
    types::{Id, ObjectId},
};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Result cardinality did not match what the execution terminal required.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResponseError {
    #[error("expected exactly one row, found 0 (entity {entity})")]
    NotFound { entity: &'static str },

    #[error("expected exactly one row, found {count} (entity {entity})")]
    NotUnique { entity: &'static str, count: usize },
}

///
/// MutationResponse
///
/// Result of a batch mutation: the typed identities the engine reported as
/// affected, after cache reconciliation succeeded.
///

#[derive(Debug)]
pub struct MutationResponse<E: EntityKind> {
    ids: Vec<Id<E>>,
}

impl<E: EntityKind> MutationResponse<E> {
    pub(crate) fn new(ids: Vec<ObjectId>) -> Self {
        Self {
            ids: ids.into_iter().map(Id::from_object).collect(),
        }
    }

    #[must_use]
    pub fn ids(&self) -> &[Id<E>] {
        &self.ids
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: Id<E>) -> bool {
        self.ids.contains(&id)
    }
}

impl<E: EntityKind> IntoIterator for MutationResponse<E> {
    type Item = Id<E>;
    type IntoIter = std::vec::IntoIter<Id<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}
