//! # Store Errors
//!
//! Every fallible backend operation returns [`StoreResult`]. The io layer maps
//! each variant onto an envelope [`ErrorKind`] so no fault ever crosses the
//! store boundary unhandled.

use shared::ErrorKind;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("voucher record is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("settings file is malformed: {0}")]
    Settings(#[from] serde_yaml::Error),

    #[error("voucher file is corrupt: {bad} of {total} records unreadable")]
    Corrupt { bad: usize, total: usize },

    /// Carries the key that was looked up; the message stays fixed for the shell
    #[error("Voucher not found")]
    NotFound(String),

    #[error("store lock poisoned by a panicked writer")]
    Lock,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("{0} total is too large to represent")]
    Overflow(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Io(_)
            | StoreError::Format(_)
            | StoreError::Settings(_)
            | StoreError::Corrupt { .. }
            | StoreError::Lock
            | StoreError::Overflow(_) => ErrorKind::Storage,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            StoreError::Export(_) => ErrorKind::Export,
        }
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Export(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for StoreError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        StoreError::Export(err.to_string())
    }
}
