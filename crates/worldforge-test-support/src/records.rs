//! Test repositories: mock `CallRecordRepository` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use worldforge_core::error::DomainError;
use worldforge_generation::domain::call::CallKind;
use worldforge_generation::domain::ports::CallRecordRepository;
use worldforge_generation::domain::record::CallAttemptRecord;

/// A call-record repository that keeps every record it is given.
#[derive(Debug, Default)]
pub struct RecordingCallRecordRepository {
    saved: Mutex<Vec<CallAttemptRecord>>,
}

impl RecordingCallRecordRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all saved records, in save order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<CallAttemptRecord> {
        self.saved.lock().unwrap().clone()
    }

    /// Counts saved records of `kind` with the given success flag.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn count(&self, kind: CallKind, success: bool) -> usize {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == kind && r.success == success)
            .count()
    }
}

#[async_trait]
impl CallRecordRepository for RecordingCallRecordRepository {
    async fn save_call_record(&self, record: &CallAttemptRecord) -> Result<(), DomainError> {
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A call-record repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingCallRecordRepository;

#[async_trait]
impl CallRecordRepository for FailingCallRecordRepository {
    async fn save_call_record(&self, _record: &CallAttemptRecord) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
