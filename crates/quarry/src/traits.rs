use crate::{
    engine::{DecodeError, Record},
    types::{Id, ObjectId, Timestamp},
    value::{TypeTag, Value},
};

///
/// EntityKind
///
/// Static identity of an entity type addressable through the engine.
///

pub trait EntityKind: Sized + 'static {
    /// Engine-side entity name.
    const ENTITY: &'static str;
}

///
/// EntityValue
///
/// An entity that can be materialized from an engine record.
/// Decoding is the object-shape reconstruction function: the engine hands
/// back records, this trait turns them into typed rows.
///

pub trait EntityValue: EntityKind {
    /// The entity's identity.
    fn id(&self) -> Id<Self>;

    /// Decode an engine record into a typed entity.
    fn from_record(record: &Record) -> Result<Self, DecodeError>;
}

///
/// FieldValue
///
/// A scalar that can be stored in a field and carried inside a `Value`.
///
/// `TAG` is the entry in the fixed engine type-tag table for this static
/// type; engine-side types with no `FieldValue` impl fall back to
/// `TypeTag::Opaque`.
///

pub trait FieldValue: Sized + 'static {
    const TAG: TypeTag;

    fn to_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

///
/// Capability markers
///
/// These bound which expression combinators exist for a value type, so an
/// ill-kinded combinator is a compile error rather than a runtime one:
///
/// - `Equatable`: `==`/`!=` and membership
/// - `Comparable`: ordering comparisons
/// - `Numeric`: arithmetic, bitwise, and numeric aggregates
/// - `TextValue`: string matching and case folding
///

pub trait Equatable {}

pub trait Comparable: FieldValue + Equatable {}

pub trait Numeric: Comparable {}

pub trait TextValue: Comparable {}

// Scalar registry: (type, tag, Value variant, capability set).
macro_rules! int_field_value {
    ($( $ty:ty => $tag:ident ),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const TAG: TypeTag = TypeTag::$tag;

                fn to_value(self) -> Value {
                    Value::Int(i64::from(self))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(n) => Self::try_from(*n).ok(),
                        _ => None,
                    }
                }
            }

            impl Equatable for $ty {}
            impl Comparable for $ty {}
            impl Numeric for $ty {}
        )*
    };
}

int_field_value! {
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u16 => Int32,
    u32 => Int64,
}

impl FieldValue for f64 {
    const TAG: TypeTag = TypeTag::Float64;

    fn to_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(n) => Some(*n),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(n) => Some(*n as Self),
            _ => None,
        }
    }
}

impl Equatable for f64 {}
impl Comparable for f64 {}
impl Numeric for f64 {}

impl FieldValue for f32 {
    const TAG: TypeTag = TypeTag::Float32;

    fn to_value(self) -> Value {
        Value::Float(f64::from(self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|n| n as Self)
    }
}

impl Equatable for f32 {}
impl Comparable for f32 {}
impl Numeric for f32 {}

impl FieldValue for bool {
    const TAG: TypeTag = TypeTag::Bool;

    fn to_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Equatable for bool {}

impl FieldValue for String {
    const TAG: TypeTag = TypeTag::Text;

    fn to_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl Equatable for String {}
impl Comparable for String {}
impl TextValue for String {}

impl FieldValue for Timestamp {
    const TAG: TypeTag = TypeTag::Timestamp;

    fn to_value(self) -> Value {
        Value::Timestamp(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl Equatable for Timestamp {}
impl Comparable for Timestamp {}

impl FieldValue for Vec<u8> {
    const TAG: TypeTag = TypeTag::Bytes;

    fn to_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl Equatable for Vec<u8> {}

impl FieldValue for ObjectId {
    const TAG: TypeTag = TypeTag::ObjectId;

    fn to_value(self) -> Value {
        Value::Id(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }
}

impl Equatable for ObjectId {}

impl<E: EntityKind> FieldValue for Id<E> {
    const TAG: TypeTag = TypeTag::ObjectId;

    fn to_value(self) -> Value {
        Value::Id(self.object())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Id(id) => Some(Self::from_object(*id)),
            _ => None,
        }
    }
}

impl<E: EntityKind> Equatable for Id<E> {}
