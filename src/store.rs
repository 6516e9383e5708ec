use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::backend::{BackendError, PersistenceBackend};
use crate::calendar::MonthSpan;
use crate::models::booking::{BookingKey, BookingRecord};
use crate::models::desk::{Desk, DeskCatalog, TeamRoster};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("booking backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("'{0}' is not a known team member")]
    InvalidOccupant(String),
    #[error("no bookable slot for {0}")]
    UnknownKey(BookingKey),
    #[error("flush rejected by backend: {0}")]
    FlushFailed(String),
}

/// When edits reach the backend: on every change, or only on an explicit
/// flush. The source page flip-flopped between the two, so it is a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    PerEdit,
    #[default]
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Append one record per dirty key.
    Incremental,
    /// Replace backend content with the full non-default snapshot.
    Full,
}

/// What a `load` did: how many external records were applied, how many were
/// skipped as malformed, and how many lost to a pending local edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub applied: usize,
    pub skipped: usize,
    pub kept_local: usize,
}

/// Canonical booking state for one session. Owns the (date, desk) -> occupant
/// map, reconciles it against the backend on load, and mediates every read
/// and write between the presentation layer and the backend.
pub struct BookingStore {
    catalog: DeskCatalog,
    roster: TeamRoster,
    span: MonthSpan,
    policy: FlushPolicy,
    backend: Box<dyn PersistenceBackend>,
    // Sparse: a missing key is at its desk's default occupant.
    bookings: HashMap<BookingKey, String>,
    dirty: HashSet<BookingKey>,
}

impl BookingStore {
    pub fn new(
        catalog: DeskCatalog,
        roster: TeamRoster,
        span: MonthSpan,
        backend: Box<dyn PersistenceBackend>,
        policy: FlushPolicy,
    ) -> Self {
        Self {
            catalog,
            roster,
            span,
            policy,
            backend,
            bookings: HashMap::new(),
            dirty: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &DeskCatalog {
        &self.catalog
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn span(&self) -> &MonthSpan {
        &self.span
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_dirty(&self, key: &BookingKey) -> bool {
        self.dirty.contains(key)
    }

    fn desk_for(&self, key: &BookingKey) -> Result<&Desk, StoreError> {
        if !self.span.contains(key.date) {
            return Err(StoreError::UnknownKey(*key));
        }
        self.catalog
            .by_position(key.desk_position)
            .ok_or(StoreError::UnknownKey(*key))
    }

    /// Current occupant for a slot, falling back to the desk's configured
    /// default. Read-only.
    pub fn occupant(&self, key: &BookingKey) -> Result<&str, StoreError> {
        let desk = self.desk_for(key)?;
        Ok(self
            .bookings
            .get(key)
            .map(String::as_str)
            .unwrap_or_else(|| desk.default_occupant()))
    }

    /// Assign an occupant to a slot. Setting the value it already holds is a
    /// no-op and does not mark the key dirty. Under the per-edit policy the
    /// change is flushed immediately; if that flush fails the new value and
    /// the dirty mark survive, only the error is reported.
    pub fn set_occupant(&mut self, key: BookingKey, occupant: &str) -> Result<(), StoreError> {
        if !self.roster.contains(occupant) {
            return Err(StoreError::InvalidOccupant(occupant.to_string()));
        }
        let default = self.desk_for(&key)?.default_occupant().to_string();
        let current = self
            .bookings
            .get(&key)
            .map(String::as_str)
            .unwrap_or(default.as_str());
        if current == occupant {
            return Ok(());
        }
        if occupant == default {
            self.bookings.remove(&key);
        } else {
            self.bookings.insert(key, occupant.to_string());
        }
        self.dirty.insert(key);
        if self.policy == FlushPolicy::PerEdit {
            self.flush(FlushMode::Incremental)?;
        }
        Ok(())
    }

    /// Pull all records from the backend and merge them in. Per-key rule:
    /// a dirty key keeps its pending local value, a clean key takes the
    /// external one. Records with an unknown desk, an unknown occupant or a
    /// date outside the span are skipped, not fatal. May be called again
    /// mid-session to pick up other sessions' flushes.
    pub fn load(&mut self) -> Result<LoadSummary, StoreError> {
        let records = self
            .backend
            .load()
            .map_err(|err| StoreError::BackendUnavailable(err.to_string()))?;
        let mut summary = LoadSummary::default();
        for record in records {
            let Some(desk) = self.catalog.by_label(&record.desk_label) else {
                log::warn!(
                    "skipping booking for unknown desk '{}' on {}",
                    record.desk_label,
                    record.date
                );
                summary.skipped += 1;
                continue;
            };
            if !self.roster.contains(&record.occupant) {
                log::warn!(
                    "skipping booking for unknown member '{}' on {}",
                    record.occupant,
                    record.date
                );
                summary.skipped += 1;
                continue;
            }
            if !self.span.contains(record.date) {
                log::warn!("skipping booking outside the bookable range: {}", record.date);
                summary.skipped += 1;
                continue;
            }
            let key = BookingKey::new(record.date, desk.position);
            if self.dirty.contains(&key) {
                // Pending local edit beats the last committed value.
                summary.kept_local += 1;
                continue;
            }
            if record.occupant == desk.default_occupant() {
                self.bookings.remove(&key);
            } else {
                self.bookings.insert(key, record.occupant);
            }
            summary.applied += 1;
        }
        log::info!(
            "loaded bookings: {} applied, {} skipped, {} kept local",
            summary.applied,
            summary.skipped,
            summary.kept_local
        );
        Ok(summary)
    }

    /// Persist pending edits. Returns the number of records written.
    ///
    /// Incremental appends one record per dirty key, including unassigned
    /// records for cleared slots so other sessions observe the clearing. If
    /// any append fails, no dirty flag is cleared and the whole batch is
    /// retried on the next call. Full replaces the backend content with the
    /// export snapshot and clears everything on success.
    pub fn flush(&mut self, mode: FlushMode) -> Result<usize, StoreError> {
        match mode {
            FlushMode::Incremental => {
                let mut keys: Vec<BookingKey> = self.dirty.iter().copied().collect();
                keys.sort();
                for key in &keys {
                    let record = self.record_for(key)?;
                    self.backend.append(&record).map_err(|err| match err {
                        BackendError::Unavailable(msg) => StoreError::BackendUnavailable(msg),
                        BackendError::Rejected(msg) => StoreError::FlushFailed(msg),
                    })?;
                }
                self.dirty.clear();
                Ok(keys.len())
            }
            FlushMode::Full => {
                let snapshot = self.export_snapshot();
                self.backend
                    .replace_all(&snapshot)
                    .map_err(|err| match err {
                        BackendError::Unavailable(msg) => StoreError::BackendUnavailable(msg),
                        BackendError::Rejected(msg) => StoreError::FlushFailed(msg),
                    })?;
                self.dirty.clear();
                Ok(snapshot.len())
            }
        }
    }

    /// Every slot whose occupant differs from its default, as backend-shaped
    /// records sorted by (date, desk position). Pure; identical state always
    /// yields the identical sequence.
    pub fn export_snapshot(&self) -> Vec<BookingRecord> {
        let mut keys: Vec<&BookingKey> = self.bookings.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| {
                let desk = self.catalog.by_position(key.desk_position)?;
                let occupant = self.bookings.get(key)?;
                if occupant == desk.default_occupant() {
                    return None;
                }
                Some(BookingRecord::new(key.date, desk.label.clone(), occupant.clone()))
            })
            .collect()
    }

    fn record_for(&self, key: &BookingKey) -> Result<BookingRecord, StoreError> {
        let desk = self.desk_for(key)?;
        let occupant = self
            .bookings
            .get(key)
            .map(String::as_str)
            .unwrap_or_else(|| desk.default_occupant());
        Ok(BookingRecord::new(
            key.date,
            desk.label.clone(),
            occupant.to_string(),
        ))
    }
}
