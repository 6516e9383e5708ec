use std::sync::{Arc, Mutex};

use crate::models::booking::BookingRecord;

use super::{BackendError, PersistenceBackend};

/// Session-lifetime backend. Clones share the same storage, so a caller can
/// keep one handle while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<Mutex<Vec<BookingRecord>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<BookingRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// Snapshot of the stored records, for inspection.
    pub fn records(&self) -> Vec<BookingRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<BookingRecord>, BackendError> {
        Ok(self.records())
    }

    fn append(&self, record: &BookingRecord) -> Result<(), BackendError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn replace_all(&self, records: &[BookingRecord]) -> Result<(), BackendError> {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records.to_vec();
        Ok(())
    }
}
