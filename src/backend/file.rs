use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::models::booking::BookingRecord;

use super::{BackendError, PersistenceBackend};

/// Backend that keeps all bookings in one JSON array on disk. A missing file
/// is an empty store; individually malformed rows are skipped on read so one
/// bad hand edit never hides every other booking.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Vec<serde_json::Value>, BackendError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(BackendError::Unavailable(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    err
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|err| {
            BackendError::Unavailable(format!(
                "{} is not a JSON array of bookings: {}",
                self.path.display(),
                err
            ))
        })
    }

    // Write via a sibling temp file + rename so a record either lands whole
    // or not at all.
    fn write_raw(&self, raw: &[serde_json::Value]) -> Result<(), BackendError> {
        let body = serde_json::to_string_pretty(raw)
            .map_err(|err| BackendError::Rejected(format!("failed to encode bookings: {}", err)))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    BackendError::Rejected(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        err
                    ))
                })?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|err| {
            BackendError::Rejected(format!("failed to write {}: {}", tmp.display(), err))
        })?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            BackendError::Rejected(format!(
                "failed to replace {}: {}",
                self.path.display(),
                err
            ))
        })
    }

    fn encode(record: &BookingRecord) -> Result<serde_json::Value, BackendError> {
        serde_json::to_value(record)
            .map_err(|err| BackendError::Rejected(format!("failed to encode booking: {}", err)))
    }
}

impl PersistenceBackend for FileBackend {
    fn load(&self) -> Result<Vec<BookingRecord>, BackendError> {
        let raw = self.read_raw()?;
        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<BookingRecord>(value) {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::warn!(
                        "skipping malformed booking row in {}: {}",
                        self.path.display(),
                        err
                    );
                }
            }
        }
        Ok(records)
    }

    fn append(&self, record: &BookingRecord) -> Result<(), BackendError> {
        // Re-reading keeps rows that failed to decode: an append must not
        // destroy records a newer build might understand.
        let mut raw = self.read_raw().map_err(|err| match err {
            BackendError::Unavailable(msg) => BackendError::Rejected(msg),
            other => other,
        })?;
        raw.push(Self::encode(record)?);
        self.write_raw(&raw)
    }

    fn replace_all(&self, records: &[BookingRecord]) -> Result<(), BackendError> {
        let raw = records
            .iter()
            .map(Self::encode)
            .collect::<Result<Vec<_>, _>>()?;
        self.write_raw(&raw)
    }
}
