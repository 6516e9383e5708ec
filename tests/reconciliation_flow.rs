use chrono::NaiveDate;
use deskbook::backend::{BackendError, MemoryBackend, PersistenceBackend};
use deskbook::calendar::MonthSpan;
use deskbook::models::booking::{BookingKey, BookingRecord};
use deskbook::models::desk::{DeskCatalog, TeamRoster};
use deskbook::store::{BookingStore, FlushPolicy, StoreError};

fn two_desk_store(backend: Box<dyn PersistenceBackend>) -> BookingStore {
    BookingStore::new(
        DeskCatalog::new(vec!["Desk A".to_string(), "Desk B".to_string()]),
        TeamRoster::new(vec!["Al".to_string(), "Bo".to_string()]),
        MonthSpan::single_month(2025, 5).unwrap(),
        backend,
        FlushPolicy::Explicit,
    )
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
}

struct UnreachableBackend;

impl PersistenceBackend for UnreachableBackend {
    fn load(&self) -> Result<Vec<BookingRecord>, BackendError> {
        Err(BackendError::Unavailable("connection refused".to_string()))
    }

    fn append(&self, _record: &BookingRecord) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("connection refused".to_string()))
    }

    fn replace_all(&self, _records: &[BookingRecord]) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("connection refused".to_string()))
    }
}

#[test]
fn pending_local_edit_beats_loaded_external_value() {
    let backend = MemoryBackend::with_records(vec![BookingRecord::new(may(1), "Desk A", "Bo")]);
    let mut store = two_desk_store(Box::new(backend));
    let key = BookingKey::new(may(1), 1);

    store.set_occupant(key, "Al").unwrap();
    let summary = store.load().unwrap();

    assert_eq!(store.occupant(&key).unwrap(), "Al");
    assert_eq!(summary.kept_local, 1);
    assert_eq!(summary.applied, 0);
    assert!(store.is_dirty(&key));
}

#[test]
fn clean_key_picks_up_remote_changes_on_reload() {
    let backend = MemoryBackend::with_records(vec![BookingRecord::new(may(1), "Desk A", "Al")]);
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend));
    let key = BookingKey::new(may(1), 1);

    store.load().unwrap();
    assert_eq!(store.occupant(&key).unwrap(), "Al");

    // Another session rewrote the backend
    handle
        .replace_all(&[BookingRecord::new(may(1), "Desk A", "Bo")])
        .unwrap();
    store.load().unwrap();
    assert_eq!(store.occupant(&key).unwrap(), "Bo");
}

#[test]
fn external_unassigned_record_clears_a_clean_key() {
    let backend = MemoryBackend::with_records(vec![BookingRecord::new(may(1), "Desk A", "Al")]);
    let handle = backend.clone();
    let mut store = two_desk_store(Box::new(backend));
    let key = BookingKey::new(may(1), 1);

    store.load().unwrap();
    assert_eq!(store.occupant(&key).unwrap(), "Al");

    handle
        .replace_all(&[BookingRecord::new(may(1), "Desk A", "")])
        .unwrap();
    store.load().unwrap();
    assert_eq!(store.occupant(&key).unwrap(), "");
}

#[test]
fn malformed_records_are_skipped_not_fatal() {
    let backend = MemoryBackend::with_records(vec![
        BookingRecord::new(may(1), "Unknown Desk", "Al"),
        BookingRecord::new(may(1), "Desk A", "Nobody Known"),
        BookingRecord::new(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap(), "Desk A", "Al"),
        BookingRecord::new(may(2), "Desk B", "Bo"),
    ]);
    let mut store = two_desk_store(Box::new(backend));

    let summary = store.load().unwrap();
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.skipped, 3);
    assert_eq!(store.occupant(&BookingKey::new(may(2), 2)).unwrap(), "Bo");
}

#[test]
fn repeated_records_for_one_key_apply_in_order() {
    let backend = MemoryBackend::with_records(vec![
        BookingRecord::new(may(1), "Desk A", "Al"),
        BookingRecord::new(may(1), "Desk A", "Bo"),
    ]);
    let mut store = two_desk_store(Box::new(backend));

    store.load().unwrap();
    // Appended updates supersede earlier rows
    assert_eq!(store.occupant(&BookingKey::new(may(1), 1)).unwrap(), "Bo");
}

#[test]
fn unreachable_backend_fails_load_but_defaults_still_serve() {
    let mut store = two_desk_store(Box::new(UnreachableBackend));

    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::BackendUnavailable(_)));

    // Grid still renders from defaults and stays editable
    let key = BookingKey::new(may(1), 1);
    assert_eq!(store.occupant(&key).unwrap(), "");
    store.set_occupant(key, "Al").unwrap();
    assert_eq!(store.occupant(&key).unwrap(), "Al");
}
