//! # Storage Module
//!
//! Handles all data persistence for the voucher desk.
//!
//! The domain layer talks to the [`VoucherStorage`] and [`SettingsStorage`]
//! traits; the only implementation today keeps both collections as plain
//! files in the application data directory.

pub mod file;
pub mod traits;

pub use file::{FileConnection, SettingsRepository, VoucherRepository};
pub use traits::{SettingsStorage, VoucherStorage};
