use crate::{
    compile::{PropertySpec, QueryDescriptor, ShapeKind, SortKey, StateError, Window},
    engine::{DecodeError, Engine, IdentityCache, Row},
    error::Error,
    expr::{Field, Operand, Property, Selection},
    predicate::{Filter, PredicateNode},
    query::{
        MutationResponse, ResponseError, UpdateRequest,
        shape::{Dictionaries, Identifiers, Objects, Selected, Shape},
    },
    traits::{Comparable, EntityKind, FieldValue},
};
use std::{marker::PhantomData, ops::Range};
use tracing::debug;

///
/// RequestState
///
/// Accumulated query fragments. The runtime `shape` discriminant mirrors the
/// phantom shape parameter; transitions keep the two in lockstep.
///

#[derive(Clone, Debug)]
pub(crate) struct RequestState {
    entity: &'static str,
    shape: ShapeKind,
    predicate: Option<PredicateNode>,
    having: Option<PredicateNode>,
    sort: Vec<SortKey>,
    properties: Vec<PropertySpec>,
    group_by: Vec<PropertySpec>,
    window: Option<Window>,
}

impl RequestState {
    const fn new(entity: &'static str) -> Self {
        Self {
            entity,
            shape: ShapeKind::Objects,
            predicate: None,
            having: None,
            sort: Vec::new(),
            properties: Vec::new(),
            group_by: Vec::new(),
            window: None,
        }
    }

    /// Pure compilation into the engine-native descriptor.
    fn compile(&self) -> Result<QueryDescriptor, StateError> {
        if self.having.is_some() && self.group_by.is_empty() {
            return Err(StateError::HavingWithoutGroup);
        }

        Ok(QueryDescriptor {
            entity: self.entity.to_string(),
            shape: self.shape,
            predicate: self.predicate.as_ref().map(|p| p.resolve(&Operand::Root)),
            having: self.having.as_ref().map(|p| p.resolve(&Operand::Root)),
            sort: self.sort.clone(),
            properties: self.properties.clone(),
            group_by: self.group_by.clone(),
            window: self.window,
        })
    }
}

///
/// Request
///
/// Immutable, chainable query descriptor accumulator. Every builder call
/// produces a new request; partial requests remain independently reusable.
///
/// The final type parameter is the result shape. It switches on
/// `select`/`group_by`/`object_ids` and never switches back, so object-shape
/// operations are statically unavailable once a keyed shape is set.
///

pub struct Request<'a, N, E: EntityKind, S> {
    engine: &'a N,
    state: RequestState,
    shape: S,
    _marker: PhantomData<fn(&E)>,
}

impl<N, E: EntityKind, S: Clone> Clone for Request<'_, N, E, S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine,
            state: self.state.clone(),
            shape: self.shape.clone(),
            _marker: PhantomData,
        }
    }
}

impl<'a, N, E: EntityKind> Request<'a, N, E, Objects> {
    pub(crate) const fn new(engine: &'a N) -> Self {
        Self {
            engine,
            state: RequestState::new(E::ENTITY),
            shape: Objects,
            _marker: PhantomData,
        }
    }
}

// ------------------------------------------------------------------
// Builders available in every shape
// ------------------------------------------------------------------

impl<'a, N, E: EntityKind, S> Request<'a, N, E, S> {
    fn map_state(mut self, map: impl FnOnce(&mut RequestState)) -> Self {
        map(&mut self.state);
        self
    }

    fn reshape<T>(self, shape: T, kind: ShapeKind) -> Request<'a, N, E, T> {
        let mut state = self.state;
        state.shape = kind;

        Request {
            engine: self.engine,
            state,
            shape,
            _marker: PhantomData,
        }
    }

    /// Add a predicate, AND-conjoining with any existing filter.
    #[must_use]
    pub fn filter(self, predicate: Filter<E>) -> Self {
        self.map_state(|state| {
            let node = predicate.into_node();
            state.predicate = Some(match state.predicate.take() {
                Some(existing) => existing.and(node),
                None => node,
            });
        })
    }

    /// Append an ascending sort key; call order is key order.
    #[must_use]
    pub fn order_by<V: Comparable>(self, field: Field<E, V>) -> Self {
        self.map_state(|state| {
            state.sort.push(SortKey {
                path: field.path().to_string(),
                ascending: true,
            });
        })
    }

    /// Append a descending sort key; call order is key order.
    #[must_use]
    pub fn order_by_desc<V: Comparable>(self, field: Field<E, V>) -> Self {
        self.map_state(|state| {
            state.sort.push(SortKey {
                path: field.path().to_string(),
                ascending: false,
            });
        })
    }

    /// Set the paging window to `range`, replacing any earlier window.
    #[must_use]
    pub fn subrange(self, range: Range<u32>) -> Self {
        self.map_state(|state| {
            state.window = Some(Window {
                offset: range.start,
                length: range.end.saturating_sub(range.start),
            });
        })
    }

    /// Bound the result to the first `length` rows, replacing any earlier
    /// window.
    #[must_use]
    pub fn limit(self, length: u32) -> Self {
        self.map_state(|state| {
            state.window = Some(Window { offset: 0, length });
        })
    }

    fn conjoin_having(self, predicate: Filter<E>) -> Self {
        self.map_state(|state| {
            let node = predicate.into_node();
            state.having = Some(match state.having.take() {
                Some(existing) => existing.and(node),
                None => node,
            });
        })
    }

    /// Compile the accumulated state into the engine-native descriptor.
    ///
    /// Pure: repeatable and side-effect-free. State-sequencing violations
    /// are rejected here, before anything reaches the engine.
    pub fn compile(&self) -> Result<QueryDescriptor, StateError> {
        self.state.compile()
    }

    /// Open a batch-update request seeded with this request's filter.
    #[must_use]
    pub fn update<V: FieldValue>(self, field: Field<E, V>, value: V) -> UpdateRequest<'a, N, E> {
        UpdateRequest::new(self.engine, self.state.predicate, field, value)
    }
}

// ------------------------------------------------------------------
// Shape transitions (one-directional)
// ------------------------------------------------------------------

impl<'a, N, E: EntityKind> Request<'a, N, E, Objects> {
    /// Project typed properties; the result shape becomes a typed tuple per
    /// row, reconstructed by name from the engine's keyed rows.
    #[must_use]
    pub fn select<P: Selection<E>>(self, what: P) -> Request<'a, N, E, Selected<P>> {
        let specs = what.specs();

        self.reshape(Selected(what), ShapeKind::Keyed)
            .map_state(|state| state.properties.extend(specs))
    }

    /// Project a dynamic property list; rows become name-keyed dictionaries.
    #[must_use]
    pub fn select_properties(
        self,
        properties: Vec<PropertySpec>,
    ) -> Request<'a, N, E, Dictionaries> {
        self.reshape(Dictionaries, ShapeKind::Keyed)
            .map_state(|state| state.properties.extend(properties))
    }

    /// Add a grouping key; rows become name-keyed dictionaries.
    #[must_use]
    pub fn group_by(self, property: impl Property<E>) -> Request<'a, N, E, Dictionaries> {
        let spec = property.spec();

        self.reshape(Dictionaries, ShapeKind::Keyed)
            .map_state(|state| state.group_by.push(spec))
    }

    /// Fetch bare object identities, discarding any projection state.
    #[must_use]
    pub fn object_ids(self) -> Request<'a, N, E, Identifiers> {
        self.reshape(Identifiers, ShapeKind::Ids)
            .map_state(|state| state.properties.clear())
    }
}

impl<'a, N, E: EntityKind> Request<'a, N, E, Dictionaries> {
    /// Add another grouping key; grouping is cumulative.
    #[must_use]
    pub fn group_by(self, property: impl Property<E>) -> Self {
        let spec = property.spec();
        self.map_state(|state| state.group_by.push(spec))
    }

    /// Restrict groups, AND-conjoining with any existing having predicate.
    ///
    /// Compilation rejects a having predicate with no grouping keys.
    #[must_use]
    pub fn having(self, predicate: Filter<E>) -> Self {
        self.conjoin_having(predicate)
    }

    /// Narrow the dictionary rows to a typed projection.
    #[must_use]
    pub fn select<P: Selection<E>>(self, what: P) -> Request<'a, N, E, Selected<P>> {
        let specs = what.specs();

        self.reshape(Selected(what), ShapeKind::Keyed)
            .map_state(|state| state.properties.extend(specs))
    }

    /// Append to the dynamic property list.
    #[must_use]
    pub fn select_properties(self, properties: Vec<PropertySpec>) -> Self {
        self.map_state(|state| state.properties.extend(properties))
    }
}

impl<'a, N, E: EntityKind, P> Request<'a, N, E, Selected<P>> {
    /// Add a grouping key; grouping is cumulative.
    #[must_use]
    pub fn group_by(self, property: impl Property<E>) -> Self {
        let spec = property.spec();
        self.map_state(|state| state.group_by.push(spec))
    }

    /// Restrict groups, AND-conjoining with any existing having predicate.
    #[must_use]
    pub fn having(self, predicate: Filter<E>) -> Self {
        self.conjoin_having(predicate)
    }
}

// ------------------------------------------------------------------
// Execution terminals
// ------------------------------------------------------------------

impl<N: Engine, E: EntityKind, S: Shape<E>> Request<'_, N, E, S> {
    fn fetch(&self, descriptor: &QueryDescriptor) -> Result<Vec<Row>, Error> {
        debug!(
            entity = descriptor.entity.as_str(),
            shape = ?descriptor.shape,
            "dispatching fetch"
        );

        let rows = self.engine.fetch_rows(descriptor)?;

        debug!(rows = rows.len(), "fetch returned");

        Ok(rows)
    }

    /// Execute and return all rows in result order.
    pub fn all(&self) -> Result<Vec<S::Output>, Error> {
        let descriptor = self.compile()?;
        let rows = self.fetch(&descriptor)?;

        rows.into_iter().map(|row| self.shape.decode(row)).collect()
    }

    /// Execute with the window forced to length 1 and return the first row.
    ///
    /// A previously set offset is preserved; a previously set length is not.
    pub fn first(&self) -> Result<Option<S::Output>, Error> {
        let mut state = self.state.clone();
        state.window = Some(Window {
            offset: state.window.map_or(0, |window| window.offset),
            length: 1,
        });

        let descriptor = state.compile()?;
        let rows = self.fetch(&descriptor)?;

        rows.into_iter()
            .next()
            .map(|row| self.shape.decode(row))
            .transpose()
    }

    /// Execute and require exactly one row.
    pub fn one(&self) -> Result<S::Output, Error> {
        let mut rows = self.all()?;

        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(ResponseError::NotFound { entity: E::ENTITY }.into()),
            count => Err(ResponseError::NotUnique {
                entity: E::ENTITY,
                count,
            }
            .into()),
        }
    }

    /// Execute as a scalar-count request.
    ///
    /// Projection, sort, and window state are stripped; filter, grouping,
    /// and having still apply (a grouped count counts groups).
    pub fn count(&self) -> Result<u64, Error> {
        let mut state = self.state.clone();
        state.sort.clear();
        state.properties.clear();
        state.window = None;
        state.shape = ShapeKind::Count;

        let descriptor = state.compile()?;
        let rows = self.fetch(&descriptor)?;

        match rows.first() {
            Some(Row::Count(count)) => Ok(*count),
            _ => Err(DecodeError::ShapeMismatch {
                expected: ShapeKind::Count,
            }
            .into()),
        }
    }

    /// Execute and return whether at least one matching row exists.
    pub fn exists(&self) -> Result<bool, Error> {
        Ok(self.count()? > 0)
    }

    /// Execute and return whether the result set is empty.
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(!self.exists()?)
    }
}

// ------------------------------------------------------------------
// Batch deletion
// ------------------------------------------------------------------

impl<N: Engine + IdentityCache, E: EntityKind, S> Request<'_, N, E, S> {
    /// Compile the filter into a batch delete, execute it, and reconcile the
    /// engine's local cache.
    ///
    /// Reconciliation is mandatory: the batch bypasses normal object
    /// lifecycle tracking. If it fails after the engine committed, the error
    /// reports the applied identities as a partial success.
    pub fn delete(&self) -> Result<MutationResponse<E>, Error> {
        let predicate = self
            .state
            .predicate
            .as_ref()
            .map(|p| p.resolve(&Operand::Root));

        debug!(entity = E::ENTITY, "dispatching batch delete");

        let ids = self
            .engine
            .execute_batch_delete(E::ENTITY, predicate.as_ref())?;

        self.engine
            .merge_deletions(E::ENTITY, &ids)
            .map_err(|source| Error::PartialReconciliation {
                applied: ids.clone(),
                source,
            })?;

        debug!(entity = E::ENTITY, removed = ids.len(), "batch delete reconciled");

        Ok(MutationResponse::new(ids))
    }
}
