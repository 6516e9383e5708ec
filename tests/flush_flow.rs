use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use deskbook::backend::{BackendError, MemoryBackend, PersistenceBackend};
use deskbook::calendar::MonthSpan;
use deskbook::models::booking::{BookingKey, BookingRecord};
use deskbook::models::desk::{DeskCatalog, TeamRoster};
use deskbook::store::{BookingStore, FlushMode, FlushPolicy, StoreError};

fn two_desk_store(backend: Box<dyn PersistenceBackend>, policy: FlushPolicy) -> BookingStore {
    BookingStore::new(
        DeskCatalog::new(vec!["Desk A".to_string(), "Desk B".to_string()]),
        TeamRoster::new(vec!["Al".to_string(), "Bo".to_string()]),
        MonthSpan::single_month(2025, 5).unwrap(),
        backend,
        policy,
    )
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
}

/// Append-rejecting backend with a switch, so a test can flip it back and
/// watch the retry land.
#[derive(Clone, Default)]
struct FlakyBackend {
    records: Arc<Mutex<Vec<BookingRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyBackend {
    fn records(&self) -> Vec<BookingRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl PersistenceBackend for FlakyBackend {
    fn load(&self) -> Result<Vec<BookingRecord>, BackendError> {
        Ok(self.records())
    }

    fn append(&self, record: &BookingRecord) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("permission denied".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn replace_all(&self, records: &[BookingRecord]) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("permission denied".to_string()));
        }
        *self.records.lock().unwrap() = records.to_vec();
        Ok(())
    }
}

#[test]
fn incremental_flush_appends_each_dirty_key_once() {
    let backend = MemoryBackend::new();
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::Explicit);

    store.set_occupant(BookingKey::new(may(2), 2), "Bo").unwrap();
    store.set_occupant(BookingKey::new(may(1), 1), "Al").unwrap();
    let written = store.flush(FlushMode::Incremental).unwrap();

    assert_eq!(written, 2);
    assert_eq!(store.dirty_count(), 0);
    assert_eq!(
        handle.records(),
        vec![
            BookingRecord::new(may(1), "Desk A", "Al"),
            BookingRecord::new(may(2), "Desk B", "Bo"),
        ]
    );
}

#[test]
fn rejected_append_keeps_dirty_flags_for_retry() {
    let backend = FlakyBackend::default();
    backend.fail_writes.store(true, Ordering::SeqCst);
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::Explicit);
    let key = BookingKey::new(may(1), 1);
    store.set_occupant(key, "Al").unwrap();

    let err = store.flush(FlushMode::Incremental).unwrap_err();
    assert!(matches!(err, StoreError::FlushFailed(_)));
    assert!(store.is_dirty(&key));
    assert!(handle.records().is_empty());

    // Backend recovers; the same batch goes through unchanged
    handle.fail_writes.store(false, Ordering::SeqCst);
    let written = store.flush(FlushMode::Incremental).unwrap();
    assert_eq!(written, 1);
    assert!(!store.is_dirty(&key));
    assert_eq!(handle.records(), vec![BookingRecord::new(may(1), "Desk A", "Al")]);
}

#[test]
fn full_flush_replaces_backend_content_sorted() {
    let backend = MemoryBackend::with_records(vec![BookingRecord::new(
        may(9),
        "Desk A",
        "left-over row",
    )]);
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::Explicit);

    store.set_occupant(BookingKey::new(may(3), 2), "Bo").unwrap();
    store.set_occupant(BookingKey::new(may(3), 1), "Al").unwrap();
    store.set_occupant(BookingKey::new(may(1), 2), "Al").unwrap();
    store.flush(FlushMode::Full).unwrap();

    assert_eq!(store.dirty_count(), 0);
    assert_eq!(
        handle.records(),
        vec![
            BookingRecord::new(may(1), "Desk B", "Al"),
            BookingRecord::new(may(3), "Desk A", "Al"),
            BookingRecord::new(may(3), "Desk B", "Bo"),
        ]
    );
}

#[test]
fn rejected_full_flush_clears_nothing() {
    let backend = FlakyBackend::default();
    backend.fail_writes.store(true, Ordering::SeqCst);
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::Explicit);
    store.set_occupant(BookingKey::new(may(1), 1), "Al").unwrap();

    let err = store.flush(FlushMode::Full).unwrap_err();
    assert!(matches!(err, StoreError::FlushFailed(_)));
    assert_eq!(store.dirty_count(), 1);
}

#[test]
fn per_edit_policy_flushes_on_every_change() {
    let backend = MemoryBackend::new();
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::PerEdit);

    store.set_occupant(BookingKey::new(may(1), 1), "Al").unwrap();
    assert_eq!(store.dirty_count(), 0);
    assert_eq!(handle.records(), vec![BookingRecord::new(may(1), "Desk A", "Al")]);
}

#[test]
fn per_edit_flush_failure_keeps_the_edit_and_the_dirty_flag() {
    let backend = FlakyBackend::default();
    backend.fail_writes.store(true, Ordering::SeqCst);
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::PerEdit);
    let key = BookingKey::new(may(1), 1);

    let err = store.set_occupant(key, "Al").unwrap_err();
    assert!(matches!(err, StoreError::FlushFailed(_)));
    assert_eq!(store.occupant(&key).unwrap(), "Al");
    assert!(store.is_dirty(&key));
}

#[test]
fn clearing_a_booking_appends_an_unassigned_record() {
    let backend = MemoryBackend::new();
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend), FlushPolicy::Explicit);
    let key = BookingKey::new(may(1), 1);

    store.set_occupant(key, "Al").unwrap();
    store.flush(FlushMode::Incremental).unwrap();
    store.set_occupant(key, "").unwrap();
    store.flush(FlushMode::Incremental).unwrap();

    assert_eq!(
        handle.records(),
        vec![
            BookingRecord::new(may(1), "Desk A", "Al"),
            BookingRecord::new(may(1), "Desk A", ""),
        ]
    );
}

#[test]
fn full_flush_then_fresh_load_round_trips() {
    let backend = MemoryBackend::new();
    let handle = backend.clone();
    let mut first = two_desk_store(Box::new(backend), FlushPolicy::Explicit);
    first.set_occupant(BookingKey::new(may(1), 1), "Al").unwrap();
    first.set_occupant(BookingKey::new(may(5), 2), "Bo").unwrap();
    first.flush(FlushMode::Full).unwrap();
    let flushed = first.export_snapshot();

    let mut second = two_desk_store(Box::new(handle), FlushPolicy::Explicit);
    second.load().unwrap();
    assert_eq!(second.export_snapshot(), flushed);
}
