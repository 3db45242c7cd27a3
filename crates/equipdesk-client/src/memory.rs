// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::{Mutex, MutexGuard, PoisonError};

use equipdesk_app::{Record, RecordId, RecordService, ServiceError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Insert,
    Update,
    Remove,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<Record>,
    keep_client_ids: bool,
    failures: Vec<(Operation, ServiceError)>,
    calls: Vec<Operation>,
}

impl MemoryState {
    fn attempt(&mut self, operation: Operation) -> Result<(), ServiceError> {
        self.calls.push(operation);
        match self.failures.iter().position(|(op, _)| *op == operation) {
            Some(index) => Err(self.failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }
}

/// Record service held in process memory. Backs `--demo` and tests; failures
/// can be queued per operation.
#[derive(Debug, Default)]
pub struct MemoryService {
    state: Mutex<MemoryState>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            }),
        }
    }

    /// Keep the id a client sends on insert and report none back, like a
    /// service whose insert response carries no body.
    pub fn keep_client_ids(self) -> Self {
        self.lock().keep_client_ids = true;
        self
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: ServiceError) {
        self.lock().failures.push((operation, error));
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordService for MemoryService {
    fn list(&self) -> Result<Vec<Record>, ServiceError> {
        let mut state = self.lock();
        state.attempt(Operation::List)?;
        Ok(state.records.clone())
    }

    fn insert(&self, record: &Record) -> Result<Option<RecordId>, ServiceError> {
        let mut state = self.lock();
        state.attempt(Operation::Insert)?;
        let mut stored = record.clone();
        let assigned = if state.keep_client_ids {
            None
        } else {
            let next = state
                .records
                .iter()
                .map(|existing| existing.id.get())
                .max()
                .map_or(1, |max| max + 1);
            stored.id = RecordId::new(next);
            Some(stored.id)
        };
        debug!(id = %stored.id, "memory service stored record");
        state.records.push(stored);
        Ok(assigned)
    }

    fn update(&self, record: &Record) -> Result<(), ServiceError> {
        let mut state = self.lock();
        state.attempt(Operation::Update)?;
        let index = state.position(record.id).ok_or(ServiceError::Status(404))?;
        state.records[index] = record.clone();
        Ok(())
    }

    fn remove(&self, record: &Record) -> Result<(), ServiceError> {
        let mut state = self.lock();
        state.attempt(Operation::Remove)?;
        let index = state.position(record.id).ok_or(ServiceError::Status(404))?;
        state.records.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryService, Operation};
    use equipdesk_app::{RecordId, RecordService, ServiceError};
    use equipdesk_testkit::{RecordFaker, fixture_records};

    #[test]
    fn insert_assigns_next_id() -> anyhow::Result<()> {
        let service = MemoryService::with_records(fixture_records());
        let mut record = RecordFaker::new(9).record(1);
        assert_eq!(service.insert(&record)?, Some(RecordId::new(8)));

        record.id = RecordId::new(100);
        let service = MemoryService::new().keep_client_ids();
        assert_eq!(service.insert(&record)?, None);
        assert_eq!(service.records()[0].id, RecordId::new(100));
        Ok(())
    }

    #[test]
    fn queued_failure_hits_only_its_operation_once() -> anyhow::Result<()> {
        let service = MemoryService::with_records(fixture_records());
        service.fail_next(Operation::Update, ServiceError::Timeout);

        assert_eq!(service.list()?.len(), 7);
        let record = fixture_records().remove(0);
        assert_eq!(service.update(&record), Err(ServiceError::Timeout));
        service.update(&record)?;
        assert_eq!(service.calls(Operation::Update), 2);
        assert_eq!(service.calls(Operation::List), 1);
        Ok(())
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let service = MemoryService::new();
        let record = RecordFaker::new(1).record(3);
        assert_eq!(service.update(&record), Err(ServiceError::Status(404)));
        assert_eq!(service.remove(&record), Err(ServiceError::Status(404)));
    }
}
