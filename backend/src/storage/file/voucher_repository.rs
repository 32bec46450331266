//! # Voucher Repository
//!
//! File-based voucher storage. The collection lives in `vouchers.db` at the
//! root of the data directory, one JSON document per line:
//!
//! ```text
//! data/
//! ├── settings.yaml
//! └── vouchers.db    ← This module manages this file
//! ```
//!
//! ```text
//! {"pv_number":"MI-0001","company":"mentari","date":"2025-03-01",...}
//! {"pv_number":"NES-0001","company":"nes","date":"2025-03-02",...}
//! ```
//!
//! Every mutation rewrites the whole file through a temp file and rename.
//! Unreadable lines are skipped with a warning as long as they stay below
//! [`CORRUPT_THRESHOLD`] of the file; past that the collection refuses to load.

use std::fs;
use std::path::{Path, PathBuf};

use shared::Voucher;
use tracing::{debug, info, warn};

use super::connection::FileConnection;
use crate::error::{StoreError, StoreResult};
use crate::storage::traits::VoucherStorage;

/// Fraction of unreadable lines tolerated before the file is reported corrupt
pub const CORRUPT_THRESHOLD: f64 = 0.1;

/// Vouchers read from disk plus the count of lines that had to be skipped
struct LoadedVouchers {
    vouchers: Vec<Voucher>,
    skipped: usize,
}

#[derive(Clone)]
pub struct VoucherRepository {
    connection: FileConnection,
}

impl VoucherRepository {
    pub fn new(connection: FileConnection) -> Self {
        Self { connection }
    }

    /// Read every voucher; the caller must hold the vouchers lock
    fn read_vouchers(&self) -> StoreResult<LoadedVouchers> {
        let path = self.connection.vouchers_file_path();
        self.connection.ensure_file_exists(&path)?;

        let content = fs::read_to_string(&path)?;
        let mut vouchers = Vec::new();
        let mut total = 0;
        let mut skipped = 0;

        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            total += 1;

            match serde_json::from_str::<Voucher>(line) {
                Ok(voucher) => vouchers.push(voucher),
                Err(e) => {
                    warn!("Skipping unreadable voucher on line {}: {}", line_number + 1, e);
                    skipped += 1;
                }
            }
        }

        if total > 0 && (skipped as f64 / total as f64) > CORRUPT_THRESHOLD {
            return Err(StoreError::Corrupt { bad: skipped, total });
        }

        Ok(LoadedVouchers { vouchers, skipped })
    }

    /// Replace the file contents with `vouchers`; the caller must hold the vouchers lock
    fn write_vouchers(&self, vouchers: &[Voucher]) -> StoreResult<()> {
        let mut buffer = String::new();
        for voucher in vouchers {
            buffer.push_str(&serde_json::to_string(voucher)?);
            buffer.push('\n');
        }

        let path = self.connection.vouchers_file_path();
        self.connection.write_atomic(&path, buffer.as_bytes())?;
        debug!("Wrote {} vouchers to {}", vouchers.len(), path.display());
        Ok(())
    }
}

impl VoucherStorage for VoucherRepository {
    fn list_vouchers(&self) -> StoreResult<Vec<Voucher>> {
        let _guard = self.connection.lock_vouchers()?;
        Ok(self.read_vouchers()?.vouchers)
    }

    fn get_voucher(&self, pv_number: &str) -> StoreResult<Option<Voucher>> {
        let _guard = self.connection.lock_vouchers()?;
        Ok(self
            .read_vouchers()?
            .vouchers
            .into_iter()
            .find(|v| v.pv_number == pv_number))
    }

    fn upsert_voucher(
        &self,
        pv_number: &str,
        build: &dyn Fn(Option<&Voucher>) -> Voucher,
    ) -> StoreResult<Voucher> {
        let _guard = self.connection.lock_vouchers()?;
        let mut vouchers = self.read_vouchers()?.vouchers;

        let saved = match vouchers.iter().position(|v| v.pv_number == pv_number) {
            Some(index) => {
                let updated = build(Some(&vouchers[index]));
                vouchers[index] = updated.clone();
                debug!("Replacing voucher {}", pv_number);
                updated
            }
            None => {
                let inserted = build(None);
                vouchers.push(inserted.clone());
                debug!("Inserting voucher {}", pv_number);
                inserted
            }
        };

        self.write_vouchers(&vouchers)?;
        Ok(saved)
    }

    fn delete_voucher(&self, pv_number: &str) -> StoreResult<usize> {
        let _guard = self.connection.lock_vouchers()?;
        let mut vouchers = self.read_vouchers()?.vouchers;

        match vouchers.iter().position(|v| v.pv_number == pv_number) {
            Some(index) => {
                vouchers.remove(index);
                self.write_vouchers(&vouchers)?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn clear_vouchers(&self) -> StoreResult<usize> {
        let _guard = self.connection.lock_vouchers()?;
        let path = self.connection.vouchers_file_path();

        // A corrupt file is still cleared; count what could be read.
        let removed = match self.read_vouchers() {
            Ok(loaded) => loaded.vouchers.len(),
            Err(StoreError::Corrupt { total, bad }) => total - bad,
            Err(e) => return Err(e),
        };

        self.connection.write_atomic(&path, b"")?;
        info!("Cleared {} vouchers from {}", removed, path.display());
        Ok(removed)
    }

    fn compact(&self) -> StoreResult<()> {
        let _guard = self.connection.lock_vouchers()?;
        let loaded = self.read_vouchers()?;
        self.write_vouchers(&loaded.vouchers)?;

        if loaded.skipped > 0 {
            warn!("Compaction dropped {} unreadable voucher lines", loaded.skipped);
        }
        Ok(())
    }

    fn backup_to(&self, destination: &Path) -> StoreResult<u64> {
        let _guard = self.connection.lock_vouchers()?;
        let source = self.connection.vouchers_file_path();
        self.connection.ensure_file_exists(&source)?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if fs::canonicalize(&source)? == resolve_destination(destination)? {
            warn!("Refusing to back up {} onto itself", source.display());
            return Err(StoreError::InvalidRequest(
                "Backup destination is the live voucher file".to_string(),
            ));
        }

        let bytes = fs::copy(&source, destination)?;
        info!("Copied {} bytes from {} to {}", bytes, source.display(), destination.display());
        Ok(bytes)
    }

    fn data_file(&self) -> PathBuf {
        self.connection.vouchers_file_path()
    }
}

/// Where a write to `destination` would land, following `..` and symlinks.
///
/// A destination that does not exist yet resolves through its parent.
fn resolve_destination(destination: &Path) -> StoreResult<PathBuf> {
    if destination.exists() {
        return Ok(fs::canonicalize(destination)?);
    }

    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = destination.file_name().ok_or_else(|| {
        StoreError::InvalidRequest("Backup destination has no file name".to_string())
    })?;
    Ok(fs::canonicalize(parent)?.join(name))
}
