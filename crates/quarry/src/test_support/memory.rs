use crate::{
    compile::{CompiledPredicate, QueryDescriptor, ShapeKind, SortKey, Window},
    engine::{Engine, EngineError, IdentityCache, KeyedRow, ReconcileError, Record, Row},
    test_support::eval::{Evaluator, Scope, Tables},
    traits::{EntityKind, EntityValue},
    types::{Id, ObjectId},
    value::{TypeTag, Value, sort_cmp},
};
use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    collections::BTreeMap,
};

///
/// FieldSchema / EntitySchema
///
/// Minimal schema metadata: enough to walk relationship paths and answer
/// `resolve_field_metadata`.
///

pub(crate) enum FieldSchema {
    Scalar(TypeTag),
    ToOne(&'static str),
    ToMany(&'static str),
}

pub(crate) struct EntitySchema {
    pub(crate) fields: BTreeMap<&'static str, FieldSchema>,
}

impl EntitySchema {
    pub(crate) fn new(fields: Vec<(&'static str, FieldSchema)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }
}

struct CacheEntry {
    record: Record,
    removed: bool,
}

///
/// MemoryEngine
///
/// Reference engine: executes compiled descriptors over in-memory tables and
/// keeps an identity-map cache of fetched objects, reconciled after batch
/// mutations. Single-threaded by construction (interior mutability via
/// `RefCell`), which matches how the tests drive it.
///

pub(crate) struct MemoryEngine {
    schemas: BTreeMap<&'static str, EntitySchema>,
    tables: RefCell<Tables>,
    cache: RefCell<BTreeMap<(String, ObjectId), CacheEntry>>,
    next_id: Cell<u128>,
    fail_reconcile: Cell<bool>,
}

impl MemoryEngine {
    pub(crate) fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
            tables: RefCell::new(BTreeMap::new()),
            cache: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            fail_reconcile: Cell::new(false),
        }
    }

    pub(crate) fn register(mut self, entity: &'static str, schema: EntitySchema) -> Self {
        self.schemas.insert(entity, schema);
        self
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub(crate) fn insert(&self, entity: &'static str, fields: Vec<(&str, Value)>) -> ObjectId {
        let id = ObjectId::from_u128(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);

        let record = Record {
            id,
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        };

        self.tables
            .borrow_mut()
            .entry(entity)
            .or_default()
            .insert(id, record);

        id
    }

    /// Wire a relationship: sets a to-one reference or appends to a to-many
    /// list, per the schema.
    pub(crate) fn link(&self, entity: &str, id: ObjectId, field: &str, target: ObjectId) {
        let kind = self
            .schemas
            .get(entity)
            .and_then(|schema| schema.fields.get(field))
            .expect("link target field must exist in the schema");

        let mut tables = self.tables.borrow_mut();
        let record = tables
            .get_mut(entity)
            .and_then(|table| table.get_mut(&id))
            .expect("link source record must exist");

        match kind {
            FieldSchema::ToOne(_) => {
                record.fields.insert(field.to_string(), Value::Id(target));
            }
            FieldSchema::ToMany(_) => match record.fields.get_mut(field) {
                Some(Value::List(items)) => items.push(Value::Id(target)),
                _ => {
                    record
                        .fields
                        .insert(field.to_string(), Value::List(vec![Value::Id(target)]));
                }
            },
            FieldSchema::Scalar(_) => panic!("cannot link through scalar field '{field}'"),
        }
    }

    // ------------------------------------------------------------------
    // Test hooks
    // ------------------------------------------------------------------

    /// Make the next reconciliation attempt fail, to exercise the
    /// partial-success path deterministically.
    pub(crate) fn fail_next_reconcile(&self) {
        self.fail_reconcile.set(true);
    }

    /// Read an entity straight from the identity-map cache, without
    /// re-fetching. Returns `None` when not resident or marked removed.
    pub(crate) fn cached<E: EntityValue>(&self, id: Id<E>) -> Option<E> {
        let cache = self.cache.borrow();
        let entry = cache.get(&(E::ENTITY.to_string(), id.object()))?;

        if entry.removed {
            return None;
        }

        E::from_record(&entry.record).ok()
    }

    /// Whether the cache has the entry marked as removed.
    pub(crate) fn cached_removed<E: EntityKind>(&self, id: Id<E>) -> bool {
        self.cache
            .borrow()
            .get(&(E::ENTITY.to_string(), id.object()))
            .is_some_and(|entry| entry.removed)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn matching_ids(
        &self,
        entity: &str,
        predicate: Option<&CompiledPredicate>,
    ) -> Result<Vec<ObjectId>, EngineError> {
        let tables = self.tables.borrow();
        let ev = Evaluator::new(&self.schemas, &tables);
        let entity = ev.entity_key(entity)?;

        let mut ids = Vec::new();
        if let Some(table) = tables.get(entity) {
            for record in table.values() {
                let keep = match predicate {
                    Some(predicate) => ev.eval_predicate(predicate, &Scope::root(entity, record))?,
                    None => true,
                };
                if keep {
                    ids.push(record.id);
                }
            }
        }

        Ok(ids)
    }

    fn cache_fetched(&self, entity: &str, records: &[&Record]) {
        let mut cache = self.cache.borrow_mut();
        for record in records {
            cache.insert(
                (entity.to_string(), record.id),
                CacheEntry {
                    record: (*record).clone(),
                    removed: false,
                },
            );
        }
    }

    fn take_reconcile_fault(&self) -> Result<(), ReconcileError> {
        if self.fail_reconcile.take() {
            return Err(ReconcileError::CacheUnavailable(
                "injected reconcile fault".to_string(),
            ));
        }

        Ok(())
    }
}

fn apply_window<T>(items: Vec<T>, window: Option<Window>) -> Vec<T> {
    match window {
        None => items,
        Some(window) => items
            .into_iter()
            .skip(window.offset as usize)
            .take(window.length as usize)
            .collect(),
    }
}

fn cmp_sort_keys(a: &[Value], b: &[Value], sort: &[SortKey]) -> Ordering {
    for ((x, y), key) in a.iter().zip(b).zip(sort) {
        let ord = sort_cmp(x, y);
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn cmp_value_vec(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = sort_cmp(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.len().cmp(&b.len())
}

impl Engine for MemoryEngine {
    fn fetch_rows(&self, descriptor: &QueryDescriptor) -> Result<Vec<Row>, EngineError> {
        let tables = self.tables.borrow();
        let ev = Evaluator::new(&self.schemas, &tables);
        let entity = ev.entity_key(&descriptor.entity)?;

        let mut records: Vec<&Record> = tables
            .get(entity)
            .map(|table| table.values().collect())
            .unwrap_or_default();

        if let Some(predicate) = &descriptor.predicate {
            let mut kept = Vec::with_capacity(records.len());
            for record in records {
                if ev.eval_predicate(predicate, &Scope::root(entity, record))? {
                    kept.push(record);
                }
            }
            records = kept;
        }

        if !descriptor.sort.is_empty() {
            let mut keyed: Vec<(Vec<Value>, &Record)> = Vec::with_capacity(records.len());
            for record in records {
                let mut keys = Vec::with_capacity(descriptor.sort.len());
                for sort_key in &descriptor.sort {
                    keys.push(ev.walk(entity, record, &sort_key.path)?);
                }
                keyed.push((keys, record));
            }
            keyed.sort_by(|a, b| cmp_sort_keys(&a.0, &b.0, &descriptor.sort));
            records = keyed.into_iter().map(|(_, record)| record).collect();
        }

        match descriptor.shape {
            ShapeKind::Objects => {
                let records = apply_window(records, descriptor.window);
                self.cache_fetched(entity, &records);

                Ok(records
                    .into_iter()
                    .map(|record| Row::Object(record.clone()))
                    .collect())
            }
            ShapeKind::Ids => Ok(apply_window(records, descriptor.window)
                .into_iter()
                .map(|record| Row::Id(record.id))
                .collect()),
            ShapeKind::Keyed => {
                if descriptor.group_by.is_empty() {
                    if descriptor.having.is_some() {
                        return Err(EngineError::Unsupported(
                            "having predicate without grouping".to_string(),
                        ));
                    }

                    let mut rows = Vec::new();
                    for record in apply_window(records, descriptor.window) {
                        let mut row = BTreeMap::new();
                        for spec in &descriptor.properties {
                            let value = ev.eval(&spec.expr, &Scope::root(entity, record))?;
                            row.insert(spec.name.clone(), value);
                        }
                        rows.push(Row::Keyed(KeyedRow(row)));
                    }

                    return Ok(rows);
                }

                let groups = group_records(&ev, entity, &records, descriptor)?;
                let properties = if descriptor.properties.is_empty() {
                    &descriptor.group_by
                } else {
                    &descriptor.properties
                };

                let mut rows = Vec::new();
                for members in groups {
                    let mut row = BTreeMap::new();
                    for spec in properties {
                        let value = ev.eval_grouped(&spec.expr, entity, &members)?;
                        row.insert(spec.name.clone(), value);
                    }
                    rows.push(Row::Keyed(KeyedRow(row)));
                }

                Ok(apply_window(rows, descriptor.window))
            }
            ShapeKind::Count => {
                let count = if descriptor.group_by.is_empty() {
                    records.len()
                } else {
                    group_records(&ev, entity, &records, descriptor)?.len()
                };

                Ok(vec![Row::Count(count as u64)])
            }
        }
    }

    fn execute_batch_delete(
        &self,
        entity: &str,
        predicate: Option<&CompiledPredicate>,
    ) -> Result<Vec<ObjectId>, EngineError> {
        let ids = self.matching_ids(entity, predicate)?;

        let mut tables = self.tables.borrow_mut();
        if let Some(table) = tables.get_mut(entity) {
            for id in &ids {
                table.remove(id);
            }
        }

        Ok(ids)
    }

    fn execute_batch_update(
        &self,
        entity: &str,
        predicate: Option<&CompiledPredicate>,
        assignments: &BTreeMap<String, Value>,
    ) -> Result<Vec<ObjectId>, EngineError> {
        let schema = self
            .schemas
            .get(entity)
            .ok_or_else(|| EngineError::UnknownEntity(entity.to_string()))?;

        for field in assignments.keys() {
            match schema.fields.get(field.as_str()) {
                Some(FieldSchema::Scalar(_)) => {}
                _ => {
                    return Err(EngineError::UnknownField {
                        entity: entity.to_string(),
                        path: field.clone(),
                    });
                }
            }
        }

        let ids = self.matching_ids(entity, predicate)?;

        let mut tables = self.tables.borrow_mut();
        if let Some(table) = tables.get_mut(entity) {
            for id in &ids {
                if let Some(record) = table.get_mut(id) {
                    for (field, value) in assignments {
                        record.fields.insert(field.clone(), value.clone());
                    }
                }
            }
        }

        Ok(ids)
    }

    fn resolve_field_metadata(&self, entity: &str, path: &str) -> Option<TypeTag> {
        let mut current = entity;

        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            match self.schemas.get(current)?.fields.get(segment)? {
                FieldSchema::Scalar(tag) => {
                    if segments.peek().is_none() {
                        return Some(*tag);
                    }
                    return None;
                }
                FieldSchema::ToOne(target) => {
                    if segments.peek().is_none() {
                        return Some(TypeTag::ObjectId);
                    }
                    current = target;
                }
                FieldSchema::ToMany(target) => current = target,
            }
        }

        None
    }
}

fn group_records<'a>(
    ev: &Evaluator<'a>,
    entity: &'a str,
    records: &[&'a Record],
    descriptor: &'a QueryDescriptor,
) -> Result<Vec<Vec<&'a Record>>, EngineError> {
    let mut groups: Vec<(Vec<Value>, Vec<&Record>)> = Vec::new();

    for record in records {
        let mut key = Vec::with_capacity(descriptor.group_by.len());
        for spec in &descriptor.group_by {
            key.push(ev.eval(&spec.expr, &Scope::root(entity, record))?);
        }

        match groups
            .iter_mut()
            .find(|(existing, _)| cmp_value_vec(existing, &key) == Ordering::Equal)
        {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    // canonical grouped-key order
    groups.sort_by(|a, b| cmp_value_vec(&a.0, &b.0));

    let mut out = Vec::new();
    for (_, members) in groups {
        if let Some(having) = &descriptor.having {
            if !ev.eval_predicate(having, &Scope::root(entity, members[0]))? {
                continue;
            }
        }
        out.push(members);
    }

    Ok(out)
}

impl IdentityCache for MemoryEngine {
    fn merge_deletions(&self, entity: &str, ids: &[ObjectId]) -> Result<(), ReconcileError> {
        self.take_reconcile_fault()?;

        let mut cache = self.cache.borrow_mut();
        for id in ids {
            if let Some(entry) = cache.get_mut(&(entity.to_string(), *id)) {
                entry.removed = true;
            }
        }

        Ok(())
    }

    fn merge_updates(
        &self,
        entity: &str,
        ids: &[ObjectId],
        assignments: &BTreeMap<String, Value>,
    ) -> Result<(), ReconcileError> {
        self.take_reconcile_fault()?;

        let mut cache = self.cache.borrow_mut();
        for id in ids {
            if let Some(entry) = cache.get_mut(&(entity.to_string(), *id)) {
                if entry.removed {
                    return Err(ReconcileError::StaleIdentity { id: *id });
                }

                for (field, value) in assignments {
                    entry.record.fields.insert(field.clone(), value.clone());
                }
            }
        }

        Ok(())
    }
}
