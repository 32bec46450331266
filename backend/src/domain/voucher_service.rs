//! Voucher upsert and queries.
//!
//! The store performs no field validation and stores every field as sent.
//! The only coercion is on item amounts: anything that does not parse as a
//! number counts as zero when the total is derived. Cheque number and bank
//! name are kept whatever the payment method; renderers decide what to show.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use shared::{Company, LineItem, SaveVoucherRequest, Voucher, VoucherStats};
use tracing::{debug, info, warn};

use super::counter_service::CounterService;
use crate::error::{StoreError, StoreResult};
use crate::storage::VoucherStorage;

#[derive(Clone)]
pub struct VoucherService {
    vouchers: Arc<dyn VoucherStorage>,
    counters: CounterService,
}

impl VoucherService {
    pub fn new(vouchers: Arc<dyn VoucherStorage>, counters: CounterService) -> Self {
        Self { vouchers, counters }
    }

    /// Insert or update the voucher keyed by `request.pv_number`.
    ///
    /// An existing record keeps its `created_at` unless the request carries
    /// one. `updated_at` is always refreshed and never goes backwards.
    pub fn save(&self, request: SaveVoucherRequest) -> StoreResult<String> {
        let total_amount = total_amount(&request.items).ok_or_else(|| {
            let message = "Item amounts exceed the largest supported total";
            StoreError::InvalidRequest(message.to_string())
        })?;
        let now = Utc::now();

        let saved = self.vouchers.upsert_voucher(&request.pv_number, &|existing| {
            build_voucher(&request, total_amount, existing, now)
        })?;

        info!("Saved voucher {} (total {})", saved.pv_number, saved.total_amount);
        Ok(saved.pv_number)
    }

    /// Store the form contents under a freshly allocated identifier with a new `created_at`
    pub fn save_as_new(&self, mut request: SaveVoucherRequest) -> StoreResult<String> {
        let allocated = self.counters.allocate_pv_number(request.company)?;
        debug!("Saving copy of {:?} as {}", request.pv_number, allocated.pv_number);

        request.pv_number = allocated.pv_number;
        request.created_at = Some(Utc::now());
        self.save(request)
    }

    /// Every voucher, newest first
    pub fn list_all(&self) -> StoreResult<Vec<Voucher>> {
        let mut vouchers = self.vouchers.list_vouchers()?;
        newest_first(&mut vouchers);
        Ok(vouchers)
    }

    pub fn find(&self, pv_number: &str) -> StoreResult<Voucher> {
        self.vouchers
            .get_voucher(pv_number)?
            .ok_or_else(|| StoreError::NotFound(pv_number.to_string()))
    }

    /// Case-insensitive match of `term` against identifier, payee and company.
    ///
    /// `term` is a regular expression; one that does not compile is matched
    /// literally. A blank term returns everything.
    pub fn search(&self, term: &str) -> StoreResult<Vec<Voucher>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_all();
        }

        let pattern = search_pattern(term)?;
        let mut matches: Vec<Voucher> = self
            .vouchers
            .list_vouchers()?
            .into_iter()
            .filter(|v| {
                pattern.is_match(&v.pv_number)
                    || pattern.is_match(&v.pay_to)
                    || pattern.is_match(v.company.key())
            })
            .collect();
        newest_first(&mut matches);

        debug!("Search {:?} matched {} vouchers", term, matches.len());
        Ok(matches)
    }

    /// Remove the voucher with exactly this key; a missing key removes nothing
    pub fn delete(&self, pv_number: &str) -> StoreResult<usize> {
        let removed = self.vouchers.delete_voucher(pv_number)?;
        if removed == 0 {
            warn!("Delete of {} matched no voucher", pv_number);
        } else {
            info!("Deleted voucher {}", pv_number);
        }
        Ok(removed)
    }

    /// Totals over the whole collection plus each company's next counter
    pub fn stats(&self) -> StoreResult<VoucherStats> {
        let vouchers = self.vouchers.list_vouchers()?;
        let total_amount = vouchers
            .iter()
            .try_fold(Decimal::ZERO, |sum, v| sum.checked_add(v.total_amount))
            .ok_or_else(|| StoreError::Overflow("Voucher".to_string()))?;

        let mut next_counters = BTreeMap::new();
        for company in Company::ALL {
            next_counters.insert(company, self.counters.peek(company)?);
        }

        Ok(VoucherStats {
            total_vouchers: vouchers.len(),
            total_amount,
            next_counters,
        })
    }
}

/// Sum of the parsed item amounts, `None` when it does not fit in a `Decimal`
pub fn total_amount(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.parsed_amount()))
}

/// Stable, so vouchers created at the same instant keep file order
fn newest_first(vouchers: &mut [Voucher]) {
    vouchers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn search_pattern(term: &str) -> StoreResult<Regex> {
    RegexBuilder::new(term)
        .case_insensitive(true)
        .build()
        .or_else(|_| RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build())
        .map_err(|e| StoreError::InvalidRequest(format!("Invalid search term: {}", e)))
}

fn build_voucher(
    request: &SaveVoucherRequest,
    total_amount: Decimal,
    existing: Option<&Voucher>,
    now: DateTime<Utc>,
) -> Voucher {
    let created_at = request
        .created_at
        .or_else(|| existing.map(|v| v.created_at))
        .unwrap_or(now);

    let updated_at = match existing {
        Some(previous) if previous.updated_at >= now => {
            previous.updated_at + Duration::microseconds(1)
        }
        _ => now,
    };

    Voucher {
        pv_number: request.pv_number.clone(),
        company: request.company,
        date: request.date.clone(),
        pay_to: request.pay_to.clone(),
        payment_method: request.payment_method,
        cheque_number: request.cheque_number.clone(),
        bank_name: request.bank_name.clone(),
        items: request.items.clone(),
        total_amount,
        prepared_by: request.prepared_by.clone(),
        approved_by: request.approved_by.clone(),
        received_by: request.received_by.clone(),
        prepared_sig: request.prepared_sig.clone(),
        approved_sig: request.approved_sig.clone(),
        received_sig: request.received_sig.clone(),
        created_at,
        updated_at,
    }
}
