//! Export service domain logic for the voucher desk.
//!
//! Looks up the requested vouchers, hands them to the right renderer and
//! writes the result where the caller asked (Documents by default).

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use shared::{
    ExportJsonRequest, ExportPayload, ExportPdfRequest, ExportSpreadsheetRequest,
    SaveVoucherRequest, Voucher,
};
use tracing::{error, info};

use super::pdf::PdfEngine;
use super::spreadsheet::{self, VoucherRow};
use super::{markup, target};
use crate::domain::voucher_service::VoucherService;
use crate::error::{StoreError, StoreResult};

/// Export service that handles all export-related business logic
#[derive(Clone)]
pub struct ExportService {
    vouchers: VoucherService,
    engine: Arc<dyn PdfEngine>,
}

impl ExportService {
    pub fn new(vouchers: VoucherService, engine: Arc<dyn PdfEngine>) -> Self {
        Self { vouchers, engine }
    }

    /// Fetch every listed voucher, in the order given
    fn collect(&self, pv_numbers: &[String]) -> StoreResult<Vec<Voucher>> {
        if pv_numbers.is_empty() {
            return Err(StoreError::InvalidRequest("No vouchers selected".to_string()));
        }
        pv_numbers.iter().map(|pv| self.vouchers.find(pv)).collect()
    }

    fn batch_name(prefix: &str) -> String {
        format!("{}_{}", prefix, Local::now().format("%Y%m%d"))
    }

    /// PDF of one voucher, or a batch with one page per voucher
    pub fn export_pdf(&self, request: ExportPdfRequest) -> StoreResult<ExportPayload> {
        info!("Exporting {} voucher(s) to PDF", request.pv_numbers.len());
        let vouchers = self.collect(&request.pv_numbers)?;

        let default_name = match vouchers.as_slice() {
            [single] => format!("PV_{}", single.pv_number),
            _ => Self::batch_name("PaymentVouchers"),
        };
        let path = target::resolve(&request.target, &default_name, "pdf")?;

        let rendered = self.engine.render(&vouchers)?;
        target::ensure_parent(&path)?;
        fs::write(&path, &rendered.bytes).map_err(|e| {
            error!("Failed to write PDF {}: {}", path.display(), e);
            StoreError::from(e)
        })?;

        info!("Wrote {} page PDF to {}", rendered.pages, path.display());
        Ok(ExportPayload {
            path: path.to_string_lossy().to_string(),
            count: rendered.pages,
        })
    }

    /// Spreadsheet of the listed vouchers, or of every voucher newest first
    pub fn export_spreadsheet(
        &self,
        request: ExportSpreadsheetRequest,
    ) -> StoreResult<ExportPayload> {
        let vouchers = match request.pv_numbers.as_deref() {
            Some(pv_numbers) => self.collect(pv_numbers)?,
            None => self.vouchers.list_all()?,
        };
        info!("Exporting {} voucher(s) to {:?}", vouchers.len(), request.format);

        let extension = request.format.extension();
        let default_name = Self::batch_name("PaymentVouchers");
        let path = target::resolve(&request.target, &default_name, extension)?;
        let rows: Vec<VoucherRow> = vouchers.iter().map(VoucherRow::from).collect();

        target::ensure_parent(&path)?;
        let count = spreadsheet::write(&rows, request.format, &path)?;

        info!("Wrote {} rows to {}", count, path.display());
        Ok(ExportPayload {
            path: path.to_string_lossy().to_string(),
            count,
        })
    }

    /// Printable HTML of the listed vouchers
    pub fn render_markup(&self, pv_numbers: &[String]) -> StoreResult<String> {
        let vouchers = self.collect(pv_numbers)?;
        Ok(markup::render_document(&vouchers))
    }

    /// Write one voucher as pretty JSON
    pub fn export_json(&self, request: ExportJsonRequest) -> StoreResult<PathBuf> {
        let voucher = self.vouchers.find(&request.pv_number)?;
        let path = target::resolve(&request.target, &voucher.pv_number, "json")?;

        target::ensure_parent(&path)?;
        fs::write(&path, serde_json::to_string_pretty(&voucher)?)?;

        info!("Exported voucher {} to {}", voucher.pv_number, path.display());
        Ok(path)
    }

    /// Load a voucher JSON file and save it; returns the saved identifier.
    ///
    /// Accepts both a stored voucher record and the form's own field layout.
    pub fn import_json(&self, path: &str) -> StoreResult<String> {
        let path = PathBuf::from(target::sanitize_path(path));
        let content = fs::read_to_string(&path)?;

        let request = match serde_json::from_str::<Voucher>(&content) {
            Ok(voucher) => SaveVoucherRequest::from(voucher),
            Err(_) => serde_json::from_str::<SaveVoucherRequest>(&content)?,
        };
        if request.pv_number.trim().is_empty() {
            return Err(StoreError::InvalidRequest(
                "Imported file has no voucher number".to_string(),
            ));
        }

        let pv_number = self.vouchers.save(request)?;
        info!("Imported voucher {} from {}", pv_number, path.display());
        Ok(pv_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::counter_service::CounterService;
    use crate::domain::export::pdf::{PrintPdfEngine, RenderedPdf};
    use crate::storage::file::test_utils::{sample_voucher_at, TestEnvironment};
    use crate::storage::{SettingsRepository, VoucherRepository};
    use shared::{ExportTarget, SpreadsheetFormat};

    fn setup_test_service() -> (ExportService, TestEnvironment) {
        setup_with_engine(Arc::new(PrintPdfEngine))
    }

    fn setup_with_engine(engine: Arc<dyn PdfEngine>) -> (ExportService, TestEnvironment) {
        let env = TestEnvironment::new().expect("Failed to create test environment");
        let settings = Arc::new(SettingsRepository::new(env.connection.clone()));
        let counters = CounterService::new(settings);
        let repository = Arc::new(VoucherRepository::new(env.connection.clone()));
        let vouchers = VoucherService::new(repository, counters);
        for (i, key) in ["MI-0001", "NES-0002", "MI-0003"].iter().enumerate() {
            let voucher = sample_voucher_at(key, "Supplier", i as i64);
            vouchers.save(SaveVoucherRequest::from(voucher)).unwrap();
        }
        (ExportService::new(vouchers, engine), env)
    }

    fn target_in(env: &TestEnvironment, file_name: Option<&str>) -> ExportTarget {
        ExportTarget {
            custom_path: Some(env.base_path.join("out").to_string_lossy().to_string()),
            file_name: file_name.map(str::to_string),
        }
    }

    struct CountingEngine;

    impl PdfEngine for CountingEngine {
        fn render(&self, vouchers: &[Voucher]) -> StoreResult<RenderedPdf> {
            let keys: Vec<&str> = vouchers.iter().map(|v| v.pv_number.as_str()).collect();
            Ok(RenderedPdf {
                bytes: keys.join("\n").into_bytes(),
                pages: vouchers.len(),
                signatures: 0,
            })
        }
    }

    #[test]
    fn test_single_pdf_is_named_after_voucher() {
        let (service, env) = setup_test_service();

        let payload = service
            .export_pdf(ExportPdfRequest {
                pv_numbers: vec!["NES-0002".to_string()],
                target: target_in(&env, None),
            })
            .unwrap();

        assert_eq!(payload.count, 1);
        assert!(payload.path.ends_with("PV_NES-0002.pdf"));
        assert!(fs::read(&payload.path).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn test_batch_pdf_keeps_requested_order() {
        let (service, env) = setup_with_engine(Arc::new(CountingEngine));

        let payload = service
            .export_pdf(ExportPdfRequest {
                pv_numbers: vec!["MI-0003".to_string(), "MI-0001".to_string()],
                target: target_in(&env, Some("batch")),
            })
            .unwrap();

        assert_eq!(payload.count, 2);
        assert_eq!(fs::read_to_string(&payload.path).unwrap(), "MI-0003\nMI-0001");
    }

    #[test]
    fn test_pdf_with_unknown_voucher_fails() {
        let (service, env) = setup_test_service();

        let err = service
            .export_pdf(ExportPdfRequest {
                pv_numbers: vec!["MI-0001".to_string(), "MI-0999".to_string()],
                target: target_in(&env, None),
            })
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!env.base_path.join("out").exists());
    }

    #[test]
    fn test_spreadsheet_defaults_to_every_voucher() {
        let (service, env) = setup_test_service();

        let payload = service
            .export_spreadsheet(ExportSpreadsheetRequest {
                pv_numbers: None,
                format: SpreadsheetFormat::Csv,
                target: target_in(&env, Some("all")),
            })
            .unwrap();

        assert_eq!(payload.count, 3);
        let content = fs::read_to_string(&payload.path).unwrap();
        let first_keys: Vec<&str> = content.lines().skip(1).map(|l| &l[..7]).collect();
        assert_eq!(first_keys, vec!["MI-0003", "NES-000", "MI-0001"]);
    }

    #[test]
    fn test_markup_for_selection() {
        let (service, _env) = setup_test_service();

        let html = service
            .render_markup(&["MI-0001".to_string(), "MI-0003".to_string()])
            .unwrap();

        assert_eq!(html.matches(markup::PAGE_BREAK).count(), 1);
        assert!(matches!(service.render_markup(&[]), Err(StoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_json_export_then_import_round_trips() {
        let (service, env) = setup_test_service();
        let original = service.vouchers.find("NES-0002").unwrap();

        let path = service
            .export_json(ExportJsonRequest {
                pv_number: "NES-0002".to_string(),
                target: target_in(&env, None),
            })
            .unwrap();
        assert!(path.ends_with("NES-0002.json"));

        service.vouchers.delete("NES-0002").unwrap();
        let imported = service.import_json(&path.to_string_lossy()).unwrap();

        let restored = service.vouchers.find(&imported).unwrap();
        assert_eq!(restored.pay_to, original.pay_to);
        assert_eq!(restored.items, original.items);
        assert_eq!(restored.created_at, original.created_at);
    }

    #[test]
    fn test_import_accepts_form_layout() {
        let (service, env) = setup_test_service();
        let path = env.base_path.join("form.json");
        fs::write(
            &path,
            r#"{"pvNumber":"MI-0042","company":"mentari","payTo":"Walk-in","paymentMethod":"cash","items":[{"description":"Tea","invNo":"","amount":3}]}"#,
        )
        .unwrap();

        let imported = service.import_json(&path.to_string_lossy()).unwrap();

        assert_eq!(imported, "MI-0042");
        let stored = service.vouchers.find("MI-0042").unwrap();
        assert_eq!(stored.total_amount, rust_decimal::Decimal::from(3));
    }
}
