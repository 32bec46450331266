//! # REST API for Vouchers
//!
//! Save (upsert), save as new, list/search, lookup, delete and stats.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::{
    DeletedPayload, Envelope, SaveVoucherRequest, SavedPayload, SearchQuery, StatsPayload,
    VoucherListPayload, VoucherPayload,
};
use tracing::info;

use super::{respond, respond_or};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vouchers", get(list_vouchers).post(save_voucher))
        .route("/vouchers/save-as-new", post(save_voucher_as_new))
        .route("/vouchers/:pv_number", get(get_voucher).delete(delete_voucher))
        .route("/stats", get(get_stats))
}

pub async fn save_voucher(
    State(state): State<AppState>,
    Json(request): Json<SaveVoucherRequest>,
) -> Json<Envelope<SavedPayload>> {
    info!("POST /api/vouchers - {}", request.pv_number);
    let result = state
        .voucher_service
        .save(request)
        .map(|pv_number| SavedPayload { pv_number });
    respond("save voucher", result)
}

pub async fn save_voucher_as_new(
    State(state): State<AppState>,
    Json(request): Json<SaveVoucherRequest>,
) -> Json<Envelope<SavedPayload>> {
    info!("POST /api/vouchers/save-as-new - copy of {}", request.pv_number);
    let result = state
        .voucher_service
        .save_as_new(request)
        .map(|pv_number| SavedPayload { pv_number });
    respond("save voucher as new", result)
}

/// Every voucher, or the matches of `?search=` when it is given
pub async fn list_vouchers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Envelope<VoucherListPayload>> {
    let result = match query.search.as_deref() {
        Some(term) => {
            info!("GET /api/vouchers?search={}", term);
            state.voucher_service.search(term)
        }
        None => {
            info!("GET /api/vouchers");
            state.voucher_service.list_all()
        }
    };
    respond_or(
        "list vouchers",
        result.map(|vouchers| VoucherListPayload { vouchers }),
        VoucherListPayload::default(),
    )
}

pub async fn get_voucher(
    State(state): State<AppState>,
    Path(pv_number): Path<String>,
) -> Json<Envelope<VoucherPayload>> {
    info!("GET /api/vouchers/{}", pv_number);
    let result = state.voucher_service.find(&pv_number).map(|voucher| VoucherPayload { voucher });
    respond("get voucher", result)
}

pub async fn delete_voucher(
    State(state): State<AppState>,
    Path(pv_number): Path<String>,
) -> Json<Envelope<DeletedPayload>> {
    info!("DELETE /api/vouchers/{}", pv_number);
    let result = state.voucher_service.delete(&pv_number).map(|removed| DeletedPayload { removed });
    respond("delete voucher", result)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<Envelope<StatsPayload>> {
    info!("GET /api/stats");
    respond_or(
        "stats",
        state.voucher_service.stats().map(|stats| StatsPayload { stats }),
        StatsPayload::default(),
    )
}
