//! Text shared by every rendering of a voucher document.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{LineItem, PaymentMethod, Voucher};

pub const ITEM_HEADERS: [&str; 4] = ["NO.", "DESCRIPTION", "INV/BILL NO.", "AMOUNT (RM)"];
pub const SIGNATORY_HEADERS: [&str; 3] = ["PREPARED BY", "APPROVED BY", "RECEIVED BY"];

/// `PV No: MI-0007 / 03 / 2025`; month and year come straight from the date text
pub fn pv_reference(voucher: &Voucher) -> String {
    let mut parts = voucher.date.split('-');
    let year = parts.next().unwrap_or_default();
    let month = parts.next().unwrap_or_default();
    format!("PV No: {} / {} / {}", voucher.pv_number, month, year)
}

pub fn title(voucher: &Voucher) -> String {
    let year = parse_date(&voucher.date)
        .map(|date| date.year())
        .unwrap_or_else(|| Utc::now().year());
    format!("PAYMENT VOUCHER {}", year)
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Two decimal places; blank stays blank and unparsable text is shown as typed
pub fn item_amount(item: &LineItem) -> String {
    let raw = item.amount.trim();
    if raw.is_empty() {
        return String::new();
    }
    match raw.parse::<Decimal>() {
        Ok(value) => money(value),
        Err(_) => raw.to_string(),
    }
}

pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Labels of the payment method boxes with the ticked one marked
pub fn payment_boxes(method: PaymentMethod) -> Vec<(&'static str, bool)> {
    PaymentMethod::ALL
        .iter()
        .map(|candidate| {
            let label = match candidate {
                PaymentMethod::Cheque => "Cheque",
                PaymentMethod::Cash => "Cash",
                PaymentMethod::Online => "Online",
            };
            (label, *candidate == method)
        })
        .collect()
}

/// Cheque number or bank name line under the payment boxes, if any
pub fn payment_detail(voucher: &Voucher) -> Option<String> {
    match voucher.payment_method {
        PaymentMethod::Cheque => voucher
            .cheque_number
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| format!("Cheque No: {}", value)),
        PaymentMethod::Online => voucher
            .bank_name
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| format!("Bank: {}", value)),
        PaymentMethod::Cash => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::test_utils::sample_voucher;

    #[test]
    fn test_pv_reference_and_title() {
        let voucher = sample_voucher("MI-0007", "Alice");

        assert_eq!(pv_reference(&voucher), "PV No: MI-0007 / 03 / 2025");
        assert_eq!(title(&voucher), "PAYMENT VOUCHER 2025");
    }

    #[test]
    fn test_item_amount_formatting() {
        assert_eq!(item_amount(&LineItem::new("", "", "12.5")), "12.50");
        assert_eq!(item_amount(&LineItem::new("", "", "")), "");
        assert_eq!(item_amount(&LineItem::new("", "", "n/a")), "n/a");
        assert_eq!(money(Decimal::new(15505, 3)), "15.50");
    }

    #[test]
    fn test_payment_detail_depends_on_method() {
        let mut voucher = sample_voucher("MI-0001", "Alice");
        assert_eq!(payment_detail(&voucher), None);

        voucher.payment_method = PaymentMethod::Cheque;
        voucher.cheque_number = Some("884211".to_string());
        assert_eq!(payment_detail(&voucher).as_deref(), Some("Cheque No: 884211"));
        assert_eq!(payment_boxes(voucher.payment_method)[0], ("Cheque", true));

        voucher.payment_method = PaymentMethod::Cash;
        voucher.bank_name = Some("Maybank".to_string());
        assert_eq!(payment_detail(&voucher), None);

        voucher.payment_method = PaymentMethod::Online;
        assert_eq!(payment_detail(&voucher).as_deref(), Some("Bank: Maybank"));
    }
}
