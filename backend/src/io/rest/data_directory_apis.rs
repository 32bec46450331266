//! # REST API for Store Maintenance
//!
//! Data directory location, raw backup of the voucher file, and full reset.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::{BackupRequest, DeletedPayload, Envelope, PathPayload, ResetRequest};
use tracing::{info, warn};

use super::respond;
use crate::error::StoreError;
use crate::AppState;

/// Maintenance routes, nested under `/maintenance`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reset", post(reset_all))
        .route("/backup", post(backup))
        .route("/location", get(get_location))
}

/// Wipe every voucher and counter; refused unless the shell confirmed with the user
pub async fn reset_all(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Json<Envelope<DeletedPayload>> {
    info!("POST /api/maintenance/reset - confirm: {}", request.confirm);
    if !request.confirm {
        warn!("Reset requested without confirmation");
        return respond(
            "reset",
            Err(StoreError::InvalidRequest("Reset must be confirmed".to_string())),
        );
    }
    let result = state.data_directory_service.reset_all().map(|removed| DeletedPayload { removed });
    respond("reset", result)
}

pub async fn backup(
    State(state): State<AppState>,
    Json(request): Json<BackupRequest>,
) -> Json<Envelope<PathPayload>> {
    info!("POST /api/maintenance/backup - {}", request.path);
    let result = state.data_directory_service.backup(&request.path).map(|path| PathPayload {
        path: path.to_string_lossy().to_string(),
    });
    respond("backup", result)
}

pub async fn get_location(State(state): State<AppState>) -> Json<Envelope<PathPayload>> {
    info!("GET /api/maintenance/location");
    Json(Envelope::success(PathPayload {
        path: state.data_directory_service.location().to_string_lossy().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::io::rest::test_support::TestApp;
    use serde_json::json;
    use std::fs;

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let app = TestApp::new();
        app.call("POST", "/api/counters/mentari/next", None).await;

        let refused = app.call("POST", "/api/maintenance/reset", Some(json!({}))).await;
        assert_eq!(refused["success"], false);
        assert_eq!(refused["kind"], "invalid_request");
        assert_eq!(app.call("GET", "/api/counters/mentari", None).await["counter"], 2);

        let done = app
            .call("POST", "/api/maintenance/reset", Some(json!({ "confirm": true })))
            .await;
        assert_eq!(done["success"], true);
        for company in ["mentari", "nes"] {
            let next = app.call("POST", &format!("/api/counters/{}/next", company), None).await;
            assert_eq!(next["counter"], 1);
        }
        assert_eq!(app.call("GET", "/api/vouchers", None).await["vouchers"], json!([]));
    }

    #[tokio::test]
    async fn test_backup_copies_voucher_file() {
        let app = TestApp::new();
        app.call(
            "POST",
            "/api/vouchers",
            Some(json!({ "pvNumber": "MI-0001", "company": "mentari", "payTo": "Alice" })),
        )
        .await;
        let destination = app.temp_dir.path().join("backup.db");

        let response = app
            .call(
                "POST",
                "/api/maintenance/backup",
                Some(json!({ "path": destination.to_string_lossy() })),
            )
            .await;

        assert_eq!(response["success"], true);
        assert_eq!(
            fs::read(&destination).unwrap(),
            fs::read(app.temp_dir.path().join("data").join("vouchers.db")).unwrap()
        );
    }

    #[tokio::test]
    async fn test_location_points_at_data_directory() {
        let app = TestApp::new();

        let response = app.call("GET", "/api/maintenance/location", None).await;

        assert_eq!(
            response["path"],
            app.temp_dir.path().join("data").to_string_lossy().to_string()
        );
    }
}
