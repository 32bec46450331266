//! # REST API for Voucher Counters
//!
//! - `POST /api/counters/:company/next`: consume the next number and format the identifier
//! - `GET /api/counters/:company`: next number without consuming it

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::{Company, CounterPayload, Envelope};
use tracing::info;

use super::respond;
use crate::domain::CounterService;
use crate::error::{StoreError, StoreResult};
use crate::AppState;

/// Counter routes, nested under `/counters`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:company", get(peek_counter))
        .route("/:company/next", post(allocate_counter))
}

fn parse_company(company: &str) -> StoreResult<Company> {
    company.parse().map_err(StoreError::InvalidRequest)
}

pub async fn allocate_counter(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> Json<Envelope<CounterPayload>> {
    info!("POST /api/counters/{}/next", company);
    let result = parse_company(&company)
        .and_then(|company| state.counter_service.allocate_pv_number(company));
    respond("allocate counter", result)
}

pub async fn peek_counter(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> Json<Envelope<CounterPayload>> {
    info!("GET /api/counters/{}", company);
    let result = parse_company(&company).and_then(|company| {
        let counter = state.counter_service.peek(company)?;
        Ok(CounterPayload {
            company,
            counter,
            pv_number: CounterService::format_pv_number(company, counter),
        })
    });
    respond("peek counter", result)
}

#[cfg(test)]
mod tests {
    use crate::io::rest::test_support::TestApp;
    use serde_json::json;

    #[tokio::test]
    async fn test_allocate_returns_sequential_identifiers() {
        let app = TestApp::new();

        let first = app.call("POST", "/api/counters/mentari/next", None).await;
        let second = app.call("POST", "/api/counters/MENTARI/next", None).await;
        let other = app.call("POST", "/api/counters/nes/next", None).await;

        assert_eq!(
            first,
            json!({ "success": true, "company": "mentari", "counter": 1, "pvNumber": "MI-0001" })
        );
        assert_eq!(second["pvNumber"], "MI-0002");
        assert_eq!(other["pvNumber"], "NES-0001");
    }

    #[tokio::test]
    async fn test_peek_and_unknown_company() {
        let app = TestApp::new();
        app.call("POST", "/api/counters/nes/next", None).await;

        let peeked = app.call("GET", "/api/counters/nes", None).await;
        assert_eq!(peeked["counter"], 2);
        assert_eq!(peeked["pvNumber"], "NES-0002");

        let unknown = app.call("POST", "/api/counters/acme/next", None).await;
        assert_eq!(unknown["success"], false);
        assert_eq!(unknown["kind"], "invalid_request");
    }
}
