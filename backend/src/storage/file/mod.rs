//! # File Storage Module
//!
//! File-backed storage for the voucher desk. The data directory holds two
//! independent collections:
//!
//! - `vouchers.db`: voucher records, one JSON document per line
//! - `settings.yaml`: settings records, currently the per-company counters
//!
//! All writes go through a temp file and rename. Each collection has its own
//! in-process lock shared by every clone of the [`FileConnection`].

pub mod connection;
pub mod settings_repository;
pub mod voucher_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::FileConnection;
pub use settings_repository::{counter_key, SettingsFile, SettingsRepository, COUNTER_START};
pub use voucher_repository::VoucherRepository;
