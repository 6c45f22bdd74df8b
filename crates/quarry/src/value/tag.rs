use serde::{Deserialize, Serialize};

///
/// TypeTag
///
/// Fixed table of engine property/result type tags.
///
/// Every projected expression carries one of these so the engine knows how to
/// shape the projected column. The mapping from static types is a lookup
/// table (`FieldValue::TAG`), never inferred; engine-side types with no
/// matching tag fall back to `Opaque`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Timestamp,
    Bytes,
    ObjectId,
    Uri,
    Uuid,
    /// Fallback for types the table does not recognize.
    Opaque,
}
