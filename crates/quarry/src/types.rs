use crate::traits::EntityKind;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash, hash::Hasher, marker::PhantomData};
use ulid::Ulid;

///
/// ObjectId
///
/// Untyped object identity token handed out by the engine.
/// Identities are opaque correlation values, not authority-bearing tokens.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ObjectId(Ulid);

impl ObjectId {
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Ulid(value))
    }

    #[must_use]
    pub const fn nil() -> Self {
        Self(Ulid(0))
    }

    #[must_use]
    pub const fn ulid(self) -> Ulid {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// Id
///
/// Typed identity for an entity.
///
/// `Id<E>` is a boundary type: it enforces entity-kind correctness at compile
/// time and prevents accidental mixing of identities across entities. The
/// wrapped `ObjectId` is the storage-level representation; conversion in
/// either direction is explicit.
///

pub struct Id<E: EntityKind> {
    id: ObjectId,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntityKind> Id<E> {
    /// Construct a typed identity from a raw object identity.
    ///
    /// Callers must already know that `id` identifies an `E`; this constructor
    /// does not validate the association.
    #[must_use]
    pub const fn from_object(id: ObjectId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Return the untyped object identity.
    ///
    /// This is the explicit boundary crossing back to the engine-level
    /// representation.
    #[must_use]
    pub const fn object(self) -> ObjectId {
        self.id
    }
}

impl<E: EntityKind> Clone for Id<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: EntityKind> Copy for Id<E> {}

impl<E: EntityKind> PartialEq for Id<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E: EntityKind> Eq for Id<E> {}

impl<E: EntityKind> PartialOrd for Id<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: EntityKind> Ord for Id<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<E: EntityKind> Hash for Id<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<E: EntityKind> fmt::Debug for Id<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id<{}>({})", E::ENTITY, self.id)
    }
}

impl<E: EntityKind> fmt::Display for Id<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

///
/// Timestamp
///
/// Seconds since the unix epoch.
/// Own scalar newtype; no calendar arithmetic is provided here.
///

#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    #[must_use]
    pub const fn secs(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
