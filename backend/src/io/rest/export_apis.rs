//! # REST API for Data Export
//!
//! PDF, spreadsheet and preview markup of stored vouchers, plus the
//! single-voucher JSON file export and import.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use shared::{
    Envelope, ExportJsonRequest, ExportMarkupRequest, ExportPayload, ExportPdfRequest,
    ExportSpreadsheetRequest, ImportJsonRequest, MarkupPayload, PathPayload, SavedPayload,
};
use tracing::info;

use super::respond;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export/pdf", post(export_pdf))
        .route("/export/spreadsheet", post(export_spreadsheet))
        .route("/export/markup", post(export_markup))
        .route("/export/json", post(export_json))
        .route("/import/json", post(import_json))
}

pub async fn export_pdf(
    State(state): State<AppState>,
    Json(request): Json<ExportPdfRequest>,
) -> Json<Envelope<ExportPayload>> {
    info!("POST /api/export/pdf - {:?}", request.pv_numbers);
    respond("export pdf", state.export_service.export_pdf(request))
}

pub async fn export_spreadsheet(
    State(state): State<AppState>,
    Json(request): Json<ExportSpreadsheetRequest>,
) -> Json<Envelope<ExportPayload>> {
    info!("POST /api/export/spreadsheet - {:?}", request.format);
    respond("export spreadsheet", state.export_service.export_spreadsheet(request))
}

pub async fn export_markup(
    State(state): State<AppState>,
    Json(request): Json<ExportMarkupRequest>,
) -> Json<Envelope<MarkupPayload>> {
    info!("POST /api/export/markup - {:?}", request.pv_numbers);
    let result = state
        .export_service
        .render_markup(&request.pv_numbers)
        .map(|markup| MarkupPayload { markup });
    respond("export markup", result)
}

pub async fn export_json(
    State(state): State<AppState>,
    Json(request): Json<ExportJsonRequest>,
) -> Json<Envelope<PathPayload>> {
    info!("POST /api/export/json - {}", request.pv_number);
    let result = state.export_service.export_json(request).map(|path| PathPayload {
        path: path.to_string_lossy().to_string(),
    });
    respond("export json", result)
}

pub async fn import_json(
    State(state): State<AppState>,
    Json(request): Json<ImportJsonRequest>,
) -> Json<Envelope<SavedPayload>> {
    info!("POST /api/import/json - {}", request.path);
    let result = state
        .export_service
        .import_json(&request.path)
        .map(|pv_number| SavedPayload { pv_number });
    respond("import json", result)
}

#[cfg(test)]
mod tests {
    use crate::io::rest::test_support::TestApp;
    use serde_json::{json, Value};
    use std::path::Path;

    async fn seed(app: &TestApp) {
        let seeded = [
            ("MI-0001", "2025-03-14T08:00:00Z"),
            ("NES-0002", "2025-03-14T09:00:00Z"),
        ];
        for (pv, created_at) in seeded {
            app.call(
                "POST",
                "/api/vouchers",
                Some(json!({
                    "pvNumber": pv,
                    "company": if pv.starts_with("NES") { "nes" } else { "mentari" },
                    "date": "2025-03-14",
                    "payTo": "Supplier",
                    "items": [{ "description": "Paper", "invNo": "P-1", "amount": "20" }],
                    "createdAt": created_at
                })),
            )
            .await;
        }
    }

    fn out_dir(app: &TestApp) -> Value {
        json!(app.temp_dir.path().join("exports").to_string_lossy())
    }

    #[tokio::test]
    async fn test_batch_pdf_export() {
        let app = TestApp::new();
        seed(&app).await;

        let response = app
            .call(
                "POST",
                "/api/export/pdf",
                Some(json!({
                    "pvNumbers": ["MI-0001", "NES-0002"],
                    "customPath": out_dir(&app),
                    "fileName": "march"
                })),
            )
            .await;

        assert_eq!(response["success"], true);
        assert_eq!(response["count"], 2);
        assert!(Path::new(response["path"].as_str().unwrap()).ends_with("march.pdf"));
    }

    #[tokio::test]
    async fn test_spreadsheet_export_of_all_vouchers() {
        let app = TestApp::new();
        seed(&app).await;

        let response = app
            .call(
                "POST",
                "/api/export/spreadsheet",
                Some(json!({ "format": "xlsx", "customPath": out_dir(&app), "fileName": "all" })),
            )
            .await;

        assert_eq!(response["success"], true);
        assert_eq!(response["count"], 2);
        assert!(Path::new(response["path"].as_str().unwrap()).exists());
    }

    #[tokio::test]
    async fn test_markup_and_unknown_voucher() {
        let app = TestApp::new();
        seed(&app).await;

        let markup = app
            .call("POST", "/api/export/markup", Some(json!({ "pvNumbers": ["NES-0002"] })))
            .await;
        assert!(markup["markup"].as_str().unwrap().contains("NES-0002"));

        let missing = app
            .call("POST", "/api/export/markup", Some(json!({ "pvNumbers": ["NES-0999"] })))
            .await;
        assert_eq!(missing["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_json_export_and_import() {
        let app = TestApp::new();
        seed(&app).await;

        let exported = app
            .call(
                "POST",
                "/api/export/json",
                Some(json!({ "pvNumber": "MI-0001", "customPath": out_dir(&app) })),
            )
            .await;
        let path = exported["path"].as_str().unwrap().to_string();

        app.call("DELETE", "/api/vouchers/MI-0001", None).await;
        let imported = app.call("POST", "/api/import/json", Some(json!({ "path": path }))).await;

        assert_eq!(imported, json!({ "success": true, "pvNumber": "MI-0001" }));
        let fetched = app.call("GET", "/api/vouchers/MI-0001", None).await;
        assert_eq!(fetched["voucher"]["created_at"], "2025-03-14T08:00:00Z");
    }
}
