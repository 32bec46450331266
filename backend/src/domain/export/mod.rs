//! # Export Module
//!
//! Turns stored vouchers into files for the user: printable HTML markup for
//! the preview, PDF (single or batch), spreadsheets, and single-voucher JSON.

pub mod export_service;
pub mod layout;
pub mod markup;
pub mod pdf;
pub mod spreadsheet;
pub mod target;

pub use export_service::ExportService;
pub use pdf::{PdfEngine, PrintPdfEngine};
