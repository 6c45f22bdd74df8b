use crate::{
    compile::{CompiledExpr, PropertySpec},
    engine::KeyedRow,
    expr::{ExprNode, Field, Operand},
    traits::FieldValue,
};
use std::{fmt, marker::PhantomData};

///
/// Cast
///
/// A named, typed projection: wraps any expression with a result name and the
/// engine type tag for `T` from the fixed lookup table.
///

pub struct Cast<E, T> {
    node: ExprNode,
    name: String,
    _marker: PhantomData<fn(&E) -> T>,
}

impl<E, T> Clone for Cast<E, T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, T> fmt::Debug for Cast<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cast")
            .field("name", &self.name)
            .field("node", &self.node)
            .finish()
    }
}

impl<E, T> Cast<E, T> {
    pub(crate) const fn new(node: ExprNode, name: String) -> Self {
        Self {
            node,
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_node(self) -> ExprNode {
        self.node
    }
}

///
/// Property
///
/// Anything that can stand in a projection or group-by position: it yields a
/// `PropertySpec` (name, root-resolved expression, type tag).
///

pub trait Property<E> {
    fn spec(&self) -> PropertySpec;
}

impl<E, V: FieldValue> Property<E> for Field<E, V> {
    fn spec(&self) -> PropertySpec {
        PropertySpec {
            name: self.path().to_string(),
            expr: CompiledExpr::KeyPath(self.path().to_string()),
            tag: V::TAG,
        }
    }
}

impl<E, T: FieldValue> Property<E> for Cast<E, T> {
    fn spec(&self) -> PropertySpec {
        PropertySpec {
            name: self.name.clone(),
            expr: self.node.resolve(&Operand::Root),
            tag: T::TAG,
        }
    }
}

///
/// TypedProperty
///
/// A property whose static result type is known, so a keyed row can be
/// decoded back into a typed value by name. Absent or null columns decode to
/// `None`.
///

pub trait TypedProperty<E>: Property<E> {
    type Output;

    fn decode(&self, row: &KeyedRow) -> Self::Output;
}

impl<E, V: FieldValue> TypedProperty<E> for Field<E, V> {
    type Output = Option<V>;

    fn decode(&self, row: &KeyedRow) -> Self::Output {
        row.get(self.path()).and_then(V::from_value)
    }
}

impl<E, T: FieldValue> TypedProperty<E> for Cast<E, T> {
    type Output = Option<T>;

    fn decode(&self, row: &KeyedRow) -> Self::Output {
        row.get(self.name()).and_then(T::from_value)
    }
}

///
/// Selection
///
/// A projection list for `select`: a single typed property or a tuple of up
/// to six. Records the name→type reverse mapping used to rebuild typed
/// tuples from the engine's keyed rows.
///

pub trait Selection<E> {
    type Output;

    fn specs(&self) -> Vec<PropertySpec>;

    fn decode(&self, row: &KeyedRow) -> Self::Output;
}

impl<E, V: FieldValue> Selection<E> for Field<E, V> {
    type Output = Option<V>;

    fn specs(&self) -> Vec<PropertySpec> {
        vec![self.spec()]
    }

    fn decode(&self, row: &KeyedRow) -> Self::Output {
        TypedProperty::decode(self, row)
    }
}

impl<E, T: FieldValue> Selection<E> for Cast<E, T> {
    type Output = Option<T>;

    fn specs(&self) -> Vec<PropertySpec> {
        vec![self.spec()]
    }

    fn decode(&self, row: &KeyedRow) -> Self::Output {
        TypedProperty::decode(self, row)
    }
}

macro_rules! tuple_selection {
    ($( ($($p:ident),+) ),+ $(,)?) => {
        $(
            impl<E, $($p: TypedProperty<E>),+> Selection<E> for ($($p,)+) {
                type Output = ($($p::Output,)+);

                fn specs(&self) -> Vec<PropertySpec> {
                    #[allow(non_snake_case)]
                    let ($($p,)+) = self;
                    vec![$($p.spec()),+]
                }

                fn decode(&self, row: &KeyedRow) -> Self::Output {
                    #[allow(non_snake_case)]
                    let ($($p,)+) = self;
                    ($($p.decode(row),)+)
                }
            }
        )+
    };
}

tuple_selection! {
    (P1, P2),
    (P1, P2, P3),
    (P1, P2, P3, P4),
    (P1, P2, P3, P4, P5),
    (P1, P2, P3, P4, P5, P6),
}
