//! Test utilities for automatic cleanup and consistent test infrastructure.
//!
//! Temporary data directories are removed when the environment is dropped,
//! even if a test panics.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::{Company, LineItem, PaymentMethod, Voucher};
use tempfile::TempDir;

use super::connection::FileConnection;

/// Test environment that provides a temporary directory and connection
/// that will be automatically cleaned up when the environment is dropped,
/// even if tests panic or fail.
pub struct TestEnvironment {
    pub connection: FileConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    /// Create a new test environment with a temporary directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = FileConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

/// Fixed instant so orderings in tests do not depend on the clock
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

/// A stored voucher with a single item, created `base_time()`
pub fn sample_voucher(pv_number: &str, pay_to: &str) -> Voucher {
    let company = if pv_number.starts_with("NES") {
        Company::Nes
    } else {
        Company::Mentari
    };

    Voucher {
        pv_number: pv_number.to_string(),
        company,
        date: "2025-03-01".to_string(),
        pay_to: pay_to.to_string(),
        payment_method: PaymentMethod::Cash,
        cheque_number: None,
        bank_name: None,
        items: vec![LineItem::new("Office supplies", "INV-001", "100.00")],
        total_amount: Decimal::new(10000, 2),
        prepared_by: "Preparer".to_string(),
        approved_by: "Approver".to_string(),
        received_by: "Receiver".to_string(),
        prepared_sig: None,
        approved_sig: None,
        received_sig: None,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

/// Same as [`sample_voucher`] but created `minutes` after `base_time()`
pub fn sample_voucher_at(pv_number: &str, pay_to: &str, minutes: i64) -> Voucher {
    let mut voucher = sample_voucher(pv_number, pay_to);
    voucher.created_at = base_time() + Duration::minutes(minutes);
    voucher.updated_at = voucher.created_at;
    voucher
}
