use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use super::counter_service::CounterService;
use super::export::target::{ensure_parent, sanitize_path};
use crate::error::{StoreError, StoreResult};
use crate::storage::VoucherStorage;

/// Service for maintenance of the data directory: location, backup, reset, flush
#[derive(Clone)]
pub struct DataDirectoryService {
    data_directory: PathBuf,
    vouchers: Arc<dyn VoucherStorage>,
    counters: CounterService,
}

impl DataDirectoryService {
    pub fn new(
        data_directory: PathBuf,
        vouchers: Arc<dyn VoucherStorage>,
        counters: CounterService,
    ) -> Self {
        Self {
            data_directory,
            vouchers,
            counters,
        }
    }

    /// Directory holding the store files
    pub fn location(&self) -> &Path {
        &self.data_directory
    }

    /// Default file name of a backup taken today
    pub fn default_backup_name() -> String {
        format!("vouchers-backup-{}.db", Local::now().format("%Y-%m-%d"))
    }

    /// Copy the voucher file verbatim to `destination`.
    ///
    /// An existing directory as destination gets a dated file name inside it.
    /// A destination that resolves to the live voucher file, through `..` or
    /// a symlink, is refused. Counters are not part of the copy. The copy is consistent against
    /// writers in this process only.
    pub fn backup(&self, destination: &str) -> StoreResult<PathBuf> {
        let cleaned = sanitize_path(destination);
        if cleaned.is_empty() {
            return Err(StoreError::InvalidRequest("Backup destination is required".to_string()));
        }

        let mut target = PathBuf::from(cleaned);
        if target.is_dir() {
            target = target.join(Self::default_backup_name());
        }
        ensure_parent(&target)?;
        self.vouchers.backup_to(&target)?;
        info!("Backed up vouchers to {}", target.display());
        Ok(target)
    }

    /// Delete every voucher and counter, then seed all counters back to 1
    pub fn reset_all(&self) -> StoreResult<usize> {
        warn!("Resetting all voucher data in {}", self.data_directory.display());
        let removed = self.vouchers.clear_vouchers()?;
        self.counters.clear()?;
        self.counters.seed()?;
        info!("Reset complete, removed {} vouchers", removed);
        Ok(removed)
    }

    /// Compact the voucher file; safe to call repeatedly
    pub fn flush(&self) -> StoreResult<()> {
        self.vouchers.compact()
    }
}
