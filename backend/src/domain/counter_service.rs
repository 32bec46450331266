//! Counter allocation for voucher identifiers.
//!
//! Each company owns one counter holding the NEXT number to hand out. An
//! allocated number is burnt even if the voucher is never saved, so the
//! sequence is unique and increasing but may have gaps.
//!
//! Allocation is atomic only within this process: the settings repository
//! serializes read and write under one mutex. Two processes sharing a data
//! directory can still hand out the same number.

use std::sync::Arc;

use shared::{Company, CounterPayload};
use tracing::info;

use crate::error::StoreResult;
use crate::storage::SettingsStorage;

/// Width of the zero-padded sequence part of an identifier
pub const SEQUENCE_WIDTH: usize = 4;

#[derive(Clone)]
pub struct CounterService {
    settings: Arc<dyn SettingsStorage>,
}

impl CounterService {
    pub fn new(settings: Arc<dyn SettingsStorage>) -> Self {
        Self { settings }
    }

    /// Consume and return the next sequence number for `company`
    pub fn allocate_next(&self, company: Company) -> StoreResult<u32> {
        let counter = self.settings.next_counter(company)?;
        info!("Allocated counter {} for {}", counter, company);
        Ok(counter)
    }

    /// Next sequence number for `company` without consuming it
    pub fn peek(&self, company: Company) -> StoreResult<u32> {
        self.settings.peek_counter(company)
    }

    /// `{CODE}-{NNNN}`; numbers wider than four digits are not truncated
    pub fn format_pv_number(company: Company, counter: u32) -> String {
        format!("{}-{:0width$}", company.code(), counter, width = SEQUENCE_WIDTH)
    }

    pub fn allocate_pv_number(&self, company: Company) -> StoreResult<CounterPayload> {
        let counter = self.allocate_next(company)?;
        Ok(CounterPayload {
            company,
            counter,
            pv_number: Self::format_pv_number(company, counter),
        })
    }

    pub(crate) fn seed(&self) -> StoreResult<()> {
        self.settings.seed_counters(&Company::ALL)
    }

    pub(crate) fn clear(&self) -> StoreResult<()> {
        self.settings.clear_settings()
    }
}
