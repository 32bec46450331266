//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.
//!
//! Implementations must make every method atomic with respect to other calls
//! on the same collection within this process. Nothing here protects against
//! a second process writing the same files.

use std::path::{Path, PathBuf};

use shared::{Company, Voucher};

use crate::error::StoreResult;

/// Trait defining the interface for voucher collection operations
pub trait VoucherStorage: Send + Sync {
    /// All vouchers in storage order
    fn list_vouchers(&self) -> StoreResult<Vec<Voucher>>;

    /// Retrieve a voucher by its natural key
    fn get_voucher(&self, pv_number: &str) -> StoreResult<Option<Voucher>>;

    /// Insert or replace the voucher keyed by `pv_number`.
    ///
    /// `build` receives the currently stored record (if any) and returns the
    /// record to persist. Lookup and write happen under one lock.
    fn upsert_voucher(
        &self,
        pv_number: &str,
        build: &dyn Fn(Option<&Voucher>) -> Voucher,
    ) -> StoreResult<Voucher>;

    /// Remove at most one voucher; returns how many were removed
    fn delete_voucher(&self, pv_number: &str) -> StoreResult<usize>;

    /// Remove every voucher; returns how many were removed
    fn clear_vouchers(&self) -> StoreResult<usize>;

    /// Rewrite the backing file without unreadable or blank entries
    fn compact(&self) -> StoreResult<()>;

    /// Copy the backing file verbatim to `destination`; returns bytes copied
    fn backup_to(&self, destination: &Path) -> StoreResult<u64>;

    /// Path of the file holding the collection
    fn data_file(&self) -> PathBuf;
}

/// Trait defining the interface for settings and counter operations
pub trait SettingsStorage: Send + Sync {
    /// Create a counter at 1 for every company that has none
    fn seed_counters(&self, companies: &[Company]) -> StoreResult<()>;

    /// Return the next sequence number for `company` and persist it plus one
    fn next_counter(&self, company: Company) -> StoreResult<u32>;

    /// Read the next sequence number without consuming it
    fn peek_counter(&self, company: Company) -> StoreResult<u32>;

    /// Remove every settings record
    fn clear_settings(&self) -> StoreResult<()>;
}
