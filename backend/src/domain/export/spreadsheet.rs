//! Spreadsheet export: one row per voucher, in xlsx or csv.

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};
use shared::{SpreadsheetFormat, Voucher};
use tracing::debug;

use super::layout;
use crate::error::StoreResult;

pub const SHEET_NAME: &str = "Payment Vouchers";

pub const HEADERS: [&str; 10] = [
    "PV Number",
    "Company",
    "Date",
    "Pay To",
    "Payment Method",
    "Total Amount",
    "Prepared By",
    "Approved By",
    "Received By",
    "Items",
];

const TOTAL_COLUMN: u16 = 5;

/// One spreadsheet row, already formatted for display
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherRow {
    pub pv_number: String,
    pub company: String,
    pub date: String,
    pub pay_to: String,
    pub payment_method: String,
    pub total_amount: Decimal,
    pub prepared_by: String,
    pub approved_by: String,
    pub received_by: String,
    pub items: String,
}

impl From<&Voucher> for VoucherRow {
    fn from(voucher: &Voucher) -> Self {
        let items = voucher
            .items
            .iter()
            .map(|item| format!("{} (RM {})", item.description, layout::item_amount(item)))
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            pv_number: voucher.pv_number.clone(),
            company: voucher.company.key().to_uppercase(),
            date: display_date(&voucher.date),
            pay_to: voucher.pay_to.clone(),
            payment_method: voucher.payment_method.as_str().to_uppercase(),
            total_amount: voucher.total_amount,
            prepared_by: voucher.prepared_by.clone(),
            approved_by: voucher.approved_by.clone(),
            received_by: voucher.received_by.clone(),
            items,
        }
    }
}

impl VoucherRow {
    /// Cells as text, in column order
    fn cells(&self) -> [String; 10] {
        [
            self.pv_number.clone(),
            self.company.clone(),
            self.date.clone(),
            self.pay_to.clone(),
            self.payment_method.clone(),
            layout::money(self.total_amount),
            self.prepared_by.clone(),
            self.approved_by.clone(),
            self.received_by.clone(),
            self.items.clone(),
        ]
    }
}

/// `DD/MM/YYYY`, or the stored text unchanged when it is not an ISO date
pub fn display_date(date: &str) -> String {
    match layout::parse_date(date) {
        Some(parsed) => parsed.format("%d/%m/%Y").to_string(),
        None => date.to_string(),
    }
}

/// Write `rows` to `path` in `format`; returns the number of data rows
pub fn write(rows: &[VoucherRow], format: SpreadsheetFormat, path: &Path) -> StoreResult<usize> {
    match format {
        SpreadsheetFormat::Xlsx => write_xlsx(rows, path)?,
        SpreadsheetFormat::Csv => write_csv(rows, path)?,
    }
    debug!("Wrote {} spreadsheet rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn write_xlsx(rows: &[VoucherRow], path: &Path) -> StoreResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format("0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_number = index as u32 + 1;
        for (col, cell) in row.cells().iter().enumerate() {
            let col = col as u16;
            if col == TOTAL_COLUMN {
                let total = row.total_amount.to_f64().unwrap_or_default();
                worksheet.write_number_with_format(row_number, col, total, &money_format)?;
            } else {
                worksheet.write_string(row_number, col, cell)?;
            }
        }
    }

    worksheet.set_column_width(0, 12)?;
    worksheet.set_column_width(3, 28)?;
    worksheet.set_column_width(9, 60)?;

    workbook.save(path)?;
    Ok(())
}

fn write_csv(rows: &[VoucherRow], path: &Path) -> StoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::test_utils::sample_voucher;
    use shared::{LineItem, PaymentMethod};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_row_formatting() {
        let mut voucher = sample_voucher("NES-0012", "Syarikat Maju");
        voucher.payment_method = PaymentMethod::Online;
        voucher.date = "2025-03-09".to_string();
        voucher.items = vec![
            LineItem::new("Router", "INV-1", "250"),
            LineItem::new("Cabling", "INV-2", "49.9"),
        ];

        let row = VoucherRow::from(&voucher);

        assert_eq!(row.company, "NES");
        assert_eq!(row.payment_method, "ONLINE");
        assert_eq!(row.date, "09/03/2025");
        assert_eq!(row.items, "Router (RM 250.00); Cabling (RM 49.90)");
    }

    #[test]
    fn test_unparsable_date_is_kept() {
        assert_eq!(display_date("next tuesday"), "next tuesday");
        assert_eq!(display_date(""), "");
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_voucher() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vouchers.csv");
        let vouchers = [sample_voucher("MI-0001", "Alice"), sample_voucher("MI-0002", "Bob")];
        let rows: Vec<VoucherRow> = vouchers
            .iter()
            .map(VoucherRow::from)
            .collect();

        assert_eq!(write(&rows, SpreadsheetFormat::Csv, &path).unwrap(), 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADERS.join(","));
        assert!(lines[1].starts_with("MI-0001,MENTARI,01/03/2025,Alice,CASH,100.00,"));
    }

    #[test]
    fn test_xlsx_is_written() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vouchers.xlsx");
        let rows = vec![VoucherRow::from(&sample_voucher("MI-0001", "Alice"))];

        write(&rows, SpreadsheetFormat::Xlsx, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
