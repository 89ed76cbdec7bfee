//! Collection: the transactional coordinator for one entity type
//!
//! All reads and writes for an entity type go through its `Collection`.
//! Every logical write is assembled as one atomic batch carrying the
//! primary-record command and every index mutation the transition
//! requires, so indexes never drift from records.
//!
//! ## Concurrency
//!
//! Updates take an optimistic stance: the primary key is watched, the
//! current record is read, the replacement batch is built, and the
//! commit succeeds only if no other writer touched the key in between.
//! A lost race is reported to the caller (`None`, or a conflict error
//! from the `_or_fail` variant); nothing is retried internally.

use std::sync::Arc;

use tracing::{debug, warn};
use vellum_core::{
    CollectionSchema, Entity, EntityId, Error, FieldMap, Operator, QueryValue, Result,
};
use vellum_store::{Batch, Command, ExecOutcome, Store};

use crate::hooks::{HookInput, HookOutcome, Hooks, NoHooks, Operation};
use crate::keys;
use crate::mutator;
use crate::normalize::normalize;
use crate::query;

/// Page size for bulk-delete key enumeration
const SCAN_PAGE: usize = 128;

pub(crate) fn encode_record(entity: &Entity) -> Result<Vec<u8>> {
    rmp_serde::to_vec(entity).map_err(|e| Error::Serialization(e.to_string()))
}

pub(crate) fn decode_record(bytes: &[u8]) -> Result<Entity> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

enum UpdateOutcome {
    Missing,
    Conflicted,
    Updated(Entity),
}

/// Record access for one entity type
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn Store>,
    schema: CollectionSchema,
    hooks: Arc<dyn Hooks>,
}

impl Collection {
    /// Open a collection over a store with the given schema
    pub fn new(store: Arc<dyn Store>, schema: CollectionSchema) -> Self {
        Collection {
            store,
            schema,
            hooks: Arc::new(NoHooks),
        }
    }

    /// Open a collection with an observation sink attached
    pub fn with_hooks(store: Arc<dyn Store>, schema: CollectionSchema, hooks: Arc<dyn Hooks>) -> Self {
        Collection { store, schema, hooks }
    }

    /// The collection's schema
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    // ==================== Writes ====================

    /// Create one record from candidate fields
    ///
    /// Assigns the identifier and timestamps, validates, and commits the
    /// record together with all of its index entries in one batch.
    pub fn create(&self, fields: FieldMap) -> Result<Entity> {
        self.hooks.before(Operation::Create, &HookInput::Record(&fields));

        let entity = normalize(&self.schema, &fields, None)?;
        self.store.exec(self.save_batch(&entity, None)?)?;
        debug!(prefix = self.schema.prefix(), id = %entity.id, "record created");

        self.hooks.after(Operation::Create, &HookOutcome::Record(&entity));
        Ok(entity)
    }

    /// Create several records in one atomic batch
    ///
    /// Validation runs for every input before anything is written; one
    /// invalid input fails the whole call with nothing committed.
    pub fn create_many(&self, inputs: Vec<FieldMap>) -> Result<Vec<Entity>> {
        self.hooks
            .before(Operation::CreateMany, &HookInput::Records(&inputs));

        let mut entities = Vec::with_capacity(inputs.len());
        for fields in &inputs {
            entities.push(normalize(&self.schema, fields, None)?);
        }

        let mut batch = Batch::new();
        for entity in &entities {
            batch.extend(self.save_batch(entity, None)?.commands().to_vec());
        }
        self.store.exec(batch)?;
        debug!(
            prefix = self.schema.prefix(),
            count = entities.len(),
            "records created"
        );

        self.hooks
            .after(Operation::CreateMany, &HookOutcome::Records(&entities));
        Ok(entities)
    }

    /// Patch an existing record
    ///
    /// Fields in the patch overlay the stored fields; omitted fields are
    /// kept. Returns `None` when the record does not exist or when a
    /// concurrent writer committed first.
    pub fn update(&self, id: &EntityId, patch: FieldMap) -> Result<Option<Entity>> {
        match self.update_inner(id, patch)? {
            UpdateOutcome::Updated(entity) => Ok(Some(entity)),
            UpdateOutcome::Missing | UpdateOutcome::Conflicted => Ok(None),
        }
    }

    /// Patch an existing record, failing loudly
    ///
    /// Like [`Collection::update`] but a missing record is a
    /// [`Error::NotFound`] and a lost race a [`Error::Conflict`].
    pub fn update_or_fail(&self, id: &EntityId, patch: FieldMap) -> Result<Entity> {
        match self.update_inner(id, patch)? {
            UpdateOutcome::Updated(entity) => Ok(entity),
            UpdateOutcome::Missing => Err(Error::NotFound(*id)),
            UpdateOutcome::Conflicted => Err(Error::Conflict(*id)),
        }
    }

    fn update_inner(&self, id: &EntityId, patch: FieldMap) -> Result<UpdateOutcome> {
        self.hooks
            .before(Operation::Update, &HookInput::Patch { id, patch: &patch });

        let key = keys::record_key(self.schema.prefix(), id);
        let token = self.store.watch(&key)?;

        let Some(bytes) = self.store.get(&key)? else {
            self.hooks.after(Operation::Update, &HookOutcome::Maybe(None));
            return Ok(UpdateOutcome::Missing);
        };
        let prior = decode_record(&bytes)?;

        let merged = prior.merged_with(&patch);
        let entity = normalize(&self.schema, &merged, Some(&prior))?;
        let batch = self.save_batch(&entity, Some(&prior))?;

        match self.store.exec_watched(&token, batch)? {
            ExecOutcome::Committed(_) => {
                debug!(prefix = self.schema.prefix(), id = %id, "record updated");
                self.hooks
                    .after(Operation::Update, &HookOutcome::Maybe(Some(&entity)));
                Ok(UpdateOutcome::Updated(entity))
            }
            ExecOutcome::Aborted => {
                warn!(prefix = self.schema.prefix(), id = %id, "update lost a concurrent race");
                self.hooks.after(Operation::Update, &HookOutcome::Maybe(None));
                Ok(UpdateOutcome::Conflicted)
            }
        }
    }

    /// Remove one record and every index entry derived from it
    ///
    /// Returns whether a record was actually removed.
    pub fn delete(&self, id: &EntityId) -> Result<bool> {
        self.hooks.before(Operation::Delete, &HookInput::Id(id));

        let key = keys::record_key(self.schema.prefix(), id);
        let Some(bytes) = self.store.get(&key)? else {
            self.hooks.after(Operation::Delete, &HookOutcome::Deleted(false));
            return Ok(false);
        };
        let entity = decode_record(&bytes)?;

        let mut batch = Batch::new();
        batch.push(Command::Delete { key });
        batch.extend(mutator::delete_ops(&self.schema, &entity));
        let replies = self.store.exec(batch)?;

        let removed = replies.first().is_some_and(|r| r.count() == 1);
        debug!(prefix = self.schema.prefix(), id = %id, removed, "record deleted");

        self.hooks
            .after(Operation::Delete, &HookOutcome::Deleted(removed));
        Ok(removed)
    }

    /// Remove every record whose identifier matches a glob
    ///
    /// `id_glob` is matched against the identifier portion of the
    /// primary key (`*` removes the whole collection). All matching
    /// records and their index entries go in one atomic batch; the
    /// returned count is the number of records actually removed.
    pub fn delete_all(&self, id_glob: &str) -> Result<usize> {
        self.hooks
            .before(Operation::DeleteAll, &HookInput::Pattern(id_glob));

        let pattern = keys::record_pattern(self.schema.prefix(), id_glob);
        let mut record_keys = Vec::new();
        let mut cursor = 0;
        loop {
            let (next, page) = self.store.scan(&pattern, cursor, SCAN_PAGE)?;
            record_keys.extend(page);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut entities = Vec::new();
        for payload in self.store.get_many(&record_keys)?.into_iter().flatten() {
            entities.push(decode_record(&payload)?);
        }

        let mut batch = Batch::new();
        for entity in &entities {
            batch.push(Command::Delete {
                key: keys::record_key(self.schema.prefix(), &entity.id),
            });
        }
        for entity in &entities {
            batch.extend(mutator::delete_ops(&self.schema, entity));
        }
        let replies = self.store.exec(batch)?;

        let removed = replies
            .iter()
            .take(entities.len())
            .filter(|r| r.count() == 1)
            .count();
        debug!(prefix = self.schema.prefix(), removed, "bulk delete");

        self.hooks
            .after(Operation::DeleteAll, &HookOutcome::Count(removed));
        Ok(removed)
    }

    /// Rebuild every index structure from the primary records
    ///
    /// Drops all equality and ordered entries, then re-derives them from
    /// each live record. Membership entries whose record is gone are
    /// pruned. Returns the number of records reindexed. Not serialized
    /// against concurrent writers; run it while the collection is quiet.
    pub fn rebuild_indexes(&self) -> Result<usize> {
        let prefix = self.schema.prefix();
        let mut batch = Batch::new();

        for (field, kind) in self.schema.indexes() {
            match kind {
                vellum_core::IndexKind::Equality => {
                    let pattern = keys::equality_pattern(prefix, field);
                    let mut cursor = 0;
                    loop {
                        let (next, page) = self.store.scan(&pattern, cursor, SCAN_PAGE)?;
                        for key in page {
                            batch.push(Command::Delete { key });
                        }
                        if next == 0 {
                            break;
                        }
                        cursor = next;
                    }
                }
                vellum_core::IndexKind::Ordered => {
                    batch.push(Command::Delete {
                        key: keys::ordered_key(prefix, field),
                    });
                }
            }
        }

        let ids = self.store.set_members(&keys::membership_key(prefix))?;
        let record_keys: Vec<String> = ids
            .iter()
            .map(|id| format!("{prefix}:record:{id}"))
            .collect();

        let mut reindexed = 0;
        for (id, payload) in ids.iter().zip(self.store.get_many(&record_keys)?) {
            match payload {
                Some(bytes) => {
                    let entity = decode_record(&bytes)?;
                    batch.extend(mutator::save_ops(&self.schema, &entity, None));
                    reindexed += 1;
                }
                None => {
                    warn!(prefix, id = %id, "pruning membership entry with no record");
                    batch.push(Command::SetRemove {
                        key: keys::membership_key(prefix),
                        member: id.clone(),
                    });
                }
            }
        }

        self.store.exec(batch)?;
        debug!(prefix, reindexed, "indexes rebuilt");
        Ok(reindexed)
    }

    // ==================== Reads ====================

    /// Fetch one record by identifier
    pub fn get(&self, id: &EntityId) -> Result<Option<Entity>> {
        let key = keys::record_key(self.schema.prefix(), id);
        match self.store.get(&key)? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Fetch one record, failing with [`Error::NotFound`] when missing
    pub fn get_or_fail(&self, id: &EntityId) -> Result<Entity> {
        self.get(id)?.ok_or(Error::NotFound(*id))
    }

    /// Whether a record exists
    pub fn exists(&self, id: &EntityId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Number of live records, answered from the membership set
    pub fn count(&self) -> Result<u64> {
        Ok(self
            .store
            .set_len(&keys::membership_key(self.schema.prefix()))?)
    }

    /// All live records, resolved through the membership set
    ///
    /// Membership entries whose record is gone are skipped.
    pub fn find_all(&self) -> Result<Vec<Entity>> {
        let prefix = self.schema.prefix();
        let ids = self.store.set_members(&keys::membership_key(prefix))?;
        let record_keys: Vec<String> = ids
            .iter()
            .map(|id| format!("{prefix}:record:{id}"))
            .collect();

        let mut out = Vec::new();
        for (id, payload) in ids.iter().zip(self.store.get_many(&record_keys)?) {
            match payload {
                Some(bytes) => out.push(decode_record(&bytes)?),
                None => warn!(prefix, id = %id, "membership entry points at a missing record"),
            }
        }
        Ok(out)
    }

    /// Records matching one field predicate
    pub fn find_where(
        &self,
        field: &str,
        op: Operator,
        operand: &QueryValue,
    ) -> Result<Vec<Entity>> {
        query::find_where(self.store.as_ref(), &self.schema, field, op, operand)
    }

    // ==================== Internals ====================

    /// Batch for storing `entity`: the primary write plus every index
    /// mutation for the transition from `prior`
    fn save_batch(&self, entity: &Entity, prior: Option<&Entity>) -> Result<Batch> {
        let mut batch = Batch::new();
        batch.push(Command::Put {
            key: keys::record_key(self.schema.prefix(), &entity.id),
            value: encode_record(entity)?,
        });
        batch.extend(mutator::save_ops(&self.schema, entity, prior));
        Ok(batch)
    }
}
