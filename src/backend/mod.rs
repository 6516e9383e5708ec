pub mod file;
pub mod memory;
pub mod sheet;

use thiserror::Error;

use crate::models::booking::BookingRecord;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use sheet::SheetBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached, read or authenticated against.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend refused a write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Storage contract every booking backend satisfies, whether it is an
/// in-memory map, a local file or a remote sheet. All calls block.
pub trait PersistenceBackend: Send + Sync {
    /// All currently stored records. Order is preserved as stored; when one
    /// key occurs more than once, later records supersede earlier ones.
    fn load(&self) -> Result<Vec<BookingRecord>, BackendError>;

    /// Durably add one record. Either the whole record lands or nothing does.
    fn append(&self, record: &BookingRecord) -> Result<(), BackendError>;

    /// Durably replace the entire stored content with exactly these records.
    fn replace_all(&self, records: &[BookingRecord]) -> Result<(), BackendError>;
}
