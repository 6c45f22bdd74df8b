use crate::{
    compile::StateError,
    engine::{Engine, IdentityCache},
    error::Error,
    expr::{Field, Operand},
    predicate::PredicateNode,
    query::MutationResponse,
    traits::{EntityKind, FieldValue},
    value::Value,
};
use std::{collections::BTreeMap, marker::PhantomData};
use tracing::debug;

///
/// UpdateRequest
///
/// Batch-update descriptor: a filter predicate plus field→value assignments.
/// Later `update` calls add assignments; the last write per field wins, with
/// no ordering guarantee across distinct fields.
///

pub struct UpdateRequest<'a, N, E: EntityKind> {
    engine: &'a N,
    predicate: Option<PredicateNode>,
    assignments: BTreeMap<String, Value>,
    _marker: PhantomData<fn(&E)>,
}

impl<'a, N, E: EntityKind> UpdateRequest<'a, N, E> {
    pub(crate) fn new<V: FieldValue>(
        engine: &'a N,
        predicate: Option<PredicateNode>,
        field: Field<E, V>,
        value: V,
    ) -> Self {
        let request = Self {
            engine,
            predicate,
            assignments: BTreeMap::new(),
            _marker: PhantomData,
        };

        request.update(field, value)
    }

    /// Add a field assignment; a repeated field name overwrites the earlier
    /// value.
    #[must_use]
    pub fn update<V: FieldValue>(mut self, field: Field<E, V>, value: V) -> Self {
        self.assignments
            .insert(field.path().to_string(), value.to_value());
        self
    }

    /// Compile and dispatch the batch update, then reconcile the engine's
    /// local cache so resident objects reflect the new values.
    pub fn execute(&self) -> Result<MutationResponse<E>, Error>
    where
        N: Engine + IdentityCache,
    {
        for field in self.assignments.keys() {
            if field.contains('.') {
                return Err(StateError::UpdateAcrossRelationship {
                    field: field.clone(),
                }
                .into());
            }
        }

        let predicate = self.predicate.as_ref().map(|p| p.resolve(&Operand::Root));

        debug!(
            entity = E::ENTITY,
            fields = self.assignments.len(),
            "dispatching batch update"
        );

        let ids =
            self.engine
                .execute_batch_update(E::ENTITY, predicate.as_ref(), &self.assignments)?;

        self.engine
            .merge_updates(E::ENTITY, &ids, &self.assignments)
            .map_err(|source| Error::PartialReconciliation {
                applied: ids.clone(),
                source,
            })?;

        debug!(entity = E::ENTITY, updated = ids.len(), "batch update reconciled");

        Ok(MutationResponse::new(ids))
    }
}
