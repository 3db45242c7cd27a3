// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::{LoadError, PersistError, Record, RecordId, ServiceError, TentativeId};

/// Remote record service. Each call is one attempt; retries belong to the
/// implementation.
pub trait RecordService {
    fn list(&self) -> Result<Vec<Record>, ServiceError>;

    /// Returns the id the service assigned, when it reports one.
    fn insert(&self, record: &Record) -> Result<Option<RecordId>, ServiceError>;

    fn update(&self, record: &Record) -> Result<(), ServiceError>;

    fn remove(&self, record: &Record) -> Result<(), ServiceError>;
}

impl<S: RecordService + ?Sized> RecordService for &S {
    fn list(&self) -> Result<Vec<Record>, ServiceError> {
        (**self).list()
    }

    fn insert(&self, record: &Record) -> Result<Option<RecordId>, ServiceError> {
        (**self).insert(record)
    }

    fn update(&self, record: &Record) -> Result<(), ServiceError> {
        (**self).update(record)
    }

    fn remove(&self, record: &Record) -> Result<(), ServiceError> {
        (**self).remove(record)
    }
}

impl<S: RecordService + ?Sized> RecordService for Box<S> {
    fn list(&self) -> Result<Vec<Record>, ServiceError> {
        (**self).list()
    }

    fn insert(&self, record: &Record) -> Result<Option<RecordId>, ServiceError> {
        (**self).insert(record)
    }

    fn update(&self, record: &Record) -> Result<(), ServiceError> {
        (**self).update(record)
    }

    fn remove(&self, record: &Record) -> Result<(), ServiceError> {
        (**self).remove(record)
    }
}

/// One remote write, detached from the store so it can run outside any lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert {
        record: Record,
        tentative_id: TentativeId,
    },
    Update(Record),
    Remove(Record),
}

impl Mutation {
    pub fn record(&self) -> &Record {
        match self {
            Self::Insert { record, .. } | Self::Update(record) | Self::Remove(record) => record,
        }
    }

    pub fn send<S>(&self, service: &S) -> Result<Option<RecordId>, ServiceError>
    where
        S: RecordService + ?Sized,
    {
        match self {
            Self::Insert { record, .. } => service.insert(record),
            Self::Update(record) => service.update(record).map(|()| None),
            Self::Remove(record) => service.remove(record).map(|()| None),
        }
    }
}

/// Locally held list of records, newest id first after a load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// One more than the highest held id, or 1 for an empty store.
    pub fn next_tentative_id(&self) -> TentativeId {
        let next = self
            .records
            .iter()
            .map(|record| record.id.get())
            .max()
            .map_or(1, |max| max + 1);
        TentativeId::new(RecordId::new(next))
    }

    /// Replaces the held records with the service's list. A failure leaves
    /// the previous records untouched.
    pub fn load<S>(&mut self, service: &S) -> Result<usize, LoadError>
    where
        S: RecordService + ?Sized,
    {
        let mut records = service.list().inspect_err(|error| {
            warn!(%error, kept = self.records.len(), "record load failed");
        })?;
        records.sort_by(|left, right| right.id.cmp(&left.id));
        self.records = records;
        info!(count = self.records.len(), "records loaded");
        Ok(self.records.len())
    }

    pub fn insert<S>(
        &mut self,
        service: &S,
        record: Record,
        tentative_id: TentativeId,
    ) -> Result<RecordId, PersistError>
    where
        S: RecordService + ?Sized,
    {
        let mutation = Mutation::Insert {
            record,
            tentative_id,
        };
        let assigned = mutation.send(service)?;
        Ok(self.apply_insert(mutation.record().clone(), tentative_id, assigned))
    }

    pub fn update<S>(&mut self, service: &S, record: Record) -> Result<(), PersistError>
    where
        S: RecordService + ?Sized,
    {
        let mutation = self.prepare_update(record)?;
        mutation.send(service)?;
        self.apply_update(mutation.record().clone())
    }

    /// Removes a record after the service confirms. An id the store does
    /// not hold is a no-op that never reaches the service.
    pub fn remove<S>(&mut self, service: &S, id: RecordId) -> Result<Option<Record>, PersistError>
    where
        S: RecordService + ?Sized,
    {
        let Some(mutation) = self.prepare_remove(id) else {
            debug!(%id, "remove skipped, record not held");
            return Ok(None);
        };
        mutation.send(service)?;
        Ok(self.apply_remove(id))
    }

    pub(crate) fn prepare_update(&self, record: Record) -> Result<Mutation, PersistError> {
        if self.get(record.id).is_none() {
            return Err(PersistError::UnknownRecord(record.id));
        }
        Ok(Mutation::Update(record))
    }

    pub(crate) fn prepare_remove(&self, id: RecordId) -> Option<Mutation> {
        self.get(id).cloned().map(Mutation::Remove)
    }

    /// Places a confirmed insert at the head of the list, under the service's
    /// id when it reported one.
    pub(crate) fn apply_insert(
        &mut self,
        mut record: Record,
        tentative_id: TentativeId,
        assigned: Option<RecordId>,
    ) -> RecordId {
        if let Some(id) = assigned {
            if id != tentative_id.preview() {
                info!(
                    tentative = %tentative_id.preview(),
                    confirmed = %id,
                    "service reassigned record id"
                );
            }
            record.id = id;
        }
        let id = record.id;
        self.records.retain(|existing| existing.id != id);
        self.records.insert(0, record);
        id
    }

    pub(crate) fn apply_update(&mut self, record: Record) -> Result<(), PersistError> {
        let id = record.id;
        let slot = self
            .records
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or(PersistError::UnknownRecord(id))?;
        *slot = record;
        Ok(())
    }

    pub(crate) fn apply_remove(&mut self, id: RecordId) -> Option<Record> {
        let index = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(index))
    }
}
