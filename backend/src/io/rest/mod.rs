//! # REST API Interface Layer
//!
//! Loopback HTTP endpoints used by the desktop shell. Each handler calls one
//! store operation and always answers `200 OK` with an envelope:
//!
//! - success: `{"success": true, ...payload}`
//! - failure: `{"success": false, "kind": "...", "error": "...", ...fallback}`
//!
//! Read operations attach an empty fallback payload on failure so the shell
//! can keep rendering. Only a body that is not valid JSON is rejected by the
//! extractor before reaching a handler.

pub mod counter_apis;
pub mod data_directory_apis;
pub mod export_apis;
pub mod voucher_apis;

use axum::{Json, Router};
use shared::Envelope;
use tracing::{error, warn};

use crate::error::{StoreError, StoreResult};
use crate::AppState;

/// All routes, to be nested under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/counters", counter_apis::router())
        .nest("/maintenance", data_directory_apis::router())
        .merge(voucher_apis::router())
        .merge(export_apis::router())
}

fn log_failure(operation: &str, err: &StoreError) {
    match err {
        StoreError::NotFound(key) => warn!("{}: voucher {} not found", operation, key),
        StoreError::InvalidRequest(message) => warn!("{}: rejected: {}", operation, message),
        other => error!("{} failed: {}", operation, other),
    }
}

/// Envelope for a write or lookup; failures carry no payload
pub(crate) fn respond<T>(operation: &str, result: StoreResult<T>) -> Json<Envelope<T>> {
    Json(match result {
        Ok(payload) => Envelope::success(payload),
        Err(err) => {
            log_failure(operation, &err);
            Envelope::failure(err.kind(), err.to_string())
        }
    })
}

/// Envelope for a read; failures carry `fallback` as an empty result
pub(crate) fn respond_or<T>(
    operation: &str,
    result: StoreResult<T>,
    fallback: T,
) -> Json<Envelope<T>> {
    Json(match result {
        Ok(payload) => Envelope::success(payload),
        Err(err) => {
            log_failure(operation, &err);
            Envelope::failure_with(err.kind(), err.to_string(), fallback)
        }
    })
}
