//! Printable HTML for one or more vouchers.
//!
//! Each voucher is a `<section class="voucher">`. Consecutive vouchers are
//! separated by a `<div class="page-break"></div>` which the stylesheet turns
//! into a forced page break, so a batch prints one voucher per page.

use std::fmt::Write;

use shared::Voucher;

use super::layout;

pub const PAGE_BREAK: &str = r#"<div class="page-break"></div>"#;

const STYLE: &str = "\
body { font-family: Helvetica, Arial, sans-serif; font-size: 12px; margin: 0; }
.voucher { border: 2px solid #1f2937; padding: 24px; margin: 16px; }
.voucher .reference { text-align: right; font-size: 11px; margin-bottom: 16px; }
.voucher header { text-align: center; border-bottom: 2px solid #1f2937; }
.voucher header { padding-bottom: 16px; margin-bottom: 16px; }
.voucher .parties { display: flex; justify-content: space-between; margin-bottom: 16px; }
.voucher table { width: 100%; border-collapse: collapse; margin-bottom: 16px; }
.voucher th, .voucher td { border: 1px solid #1f2937; padding: 6px; }
.voucher th { background: #f3f4f6; }
.voucher td.amount, .voucher td.total { text-align: right; }
.voucher tr.total td { font-weight: bold; background: #e5e7eb; }
.voucher .signatories { display: flex; border: 1px solid #1f2937; }
.voucher .signatory { flex: 1; padding: 12px; text-align: center; }
.voucher .signatory img { max-height: 48px; max-width: 100%; }
.page-break { page-break-after: always; break-after: page; }
";

/// Full HTML document for `vouchers`, in the given order
pub fn render_document(vouchers: &[Voucher]) -> String {
    let body = vouchers
        .iter()
        .map(render_voucher)
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", PAGE_BREAK));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Payment Voucher</title>\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

fn render_voucher(voucher: &Voucher) -> String {
    let mut html = String::new();
    let company = voucher.company;

    // Writing into a String cannot fail.
    let _ = writeln!(
        html,
        r#"<section class="voucher" data-pv-number="{}">"#,
        escape(&voucher.pv_number)
    );
    let _ = writeln!(
        html,
        r#"<div class="reference">{}</div>"#,
        escape(&layout::pv_reference(voucher))
    );
    let _ = writeln!(
        html,
        "<header><div>{}</div><strong>{}</strong><div>{}</div></header>",
        escape(&layout::title(voucher)),
        escape(company.legal_name()),
        escape(company.registration())
    );
    let _ = writeln!(
        html,
        r#"<div class="parties"><div><b>Pay To:</b> {}</div><div><b>Date:</b> {}</div></div>"#,
        if voucher.pay_to.is_empty() {
            "_________________".to_string()
        } else {
            escape(&voucher.pay_to)
        },
        escape(&voucher.date)
    );

    html.push_str(r#"<div class="payment"><b>Payment by:</b> "#);
    for (label, checked) in layout::payment_boxes(voucher.payment_method) {
        let _ = write!(
            html,
            r#"<label><input type="checkbox" disabled{}> {}</label> "#,
            if checked { " checked" } else { "" },
            label
        );
    }
    if let Some(detail) = layout::payment_detail(voucher) {
        let _ = write!(html, "<div>{}</div>", escape(&detail));
    }
    html.push_str("</div>\n");

    html.push_str("<table>\n<thead><tr>");
    for header in layout::ITEM_HEADERS {
        let _ = write!(html, "<th>{}</th>", header);
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for (index, item) in voucher.items.iter().enumerate() {
        let _ = writeln!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td class="amount">{}</td></tr>"#,
            index + 1,
            escape(&item.description),
            escape(&item.inv_no),
            escape(&layout::item_amount(item))
        );
    }
    let _ = writeln!(
        html,
        r#"<tr class="total"><td colspan="3" class="total">TOTAL RM</td><td class="total">{}</td></tr>"#,
        layout::money(voucher.total_amount)
    );
    html.push_str("</tbody>\n</table>\n");

    html.push_str(r#"<div class="signatories">"#);
    let signatories = [
        (&voucher.prepared_by, &voucher.prepared_sig),
        (&voucher.approved_by, &voucher.approved_sig),
        (&voucher.received_by, &voucher.received_sig),
    ];
    for (header, (name, signature)) in layout::SIGNATORY_HEADERS.iter().zip(signatories) {
        let _ = write!(html, r#"<div class="signatory"><b>{}</b>"#, header);
        if let Some(image) = signature.as_deref().filter(|s| s.starts_with("data:image/")) {
            let _ = write!(html, r#"<img src="{}" alt="Signature">"#, escape(image));
        }
        let _ = write!(html, "<div>{}</div></div>", escape(name));
    }
    html.push_str("</div>\n</section>");

    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::test_utils::sample_voucher;

    #[test]
    fn test_batch_has_one_section_per_voucher_and_breaks_between() {
        let vouchers = vec![
            sample_voucher("MI-0001", "Alice"),
            sample_voucher("NES-0002", "Bob"),
            sample_voucher("MI-0003", "Carol"),
        ];

        let html = render_document(&vouchers);

        assert_eq!(html.matches(r#"<section class="voucher""#).count(), 3);
        assert_eq!(html.matches(PAGE_BREAK).count(), 2);
        assert!(html.find("MI-0001").unwrap() < html.find("NES-0002").unwrap());
        assert!(html.contains("NES SOLUTION &amp; NETWORK SDN BHD"));
    }

    #[test]
    fn test_single_voucher_has_no_page_break() {
        let html = render_document(&[sample_voucher("MI-0001", "Alice")]);

        assert!(!html.contains(PAGE_BREAK));
        assert!(html.contains("PV No: MI-0001 / 03 / 2025"));
        assert!(html.contains("TOTAL RM"));
        assert!(html.contains("100.00"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut voucher = sample_voucher("MI-0001", "<script>alert(1)</script>");
        voucher.approved_sig = Some("javascript:alert(1)".to_string());

        let html = render_document(&[voucher]);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("javascript:"));
    }
}
