//! # Domain Module
//!
//! Business logic of the voucher desk, independent of the HTTP boundary and of
//! the file layout underneath.
//!
//! - **counter_service**: per-company sequence numbers and identifier format
//! - **voucher_service**: upsert, lookup, search, delete and stats
//! - **data_directory_service**: location, backup, full reset, flush
//! - **export**: markup preview, PDF, spreadsheet and JSON files

pub mod counter_service;
pub mod data_directory_service;
pub mod export;
pub mod voucher_service;

pub use counter_service::CounterService;
pub use data_directory_service::DataDirectoryService;
pub use export::{ExportService, PdfEngine, PrintPdfEngine};
pub use voucher_service::VoucherService;
