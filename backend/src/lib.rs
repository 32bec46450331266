//! # Voucher Backend
//!
//! Contains all non-UI logic for the payment voucher desk.
//!
//! ```text
//! Desktop shell (window, form, dialogs)
//!     ↓  loopback HTTP, JSON envelopes
//! IO Layer (REST handlers)
//!     ↓
//! Domain Layer (counters, vouchers, maintenance, export)
//!     ↓
//! Storage Layer (vouchers.db, settings.yaml)
//! ```
//!
//! A single [`Backend`] is opened at process start and its [`AppState`] is
//! handed to the router. Nothing is kept in globals.

pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod storage;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::{
    CounterService, DataDirectoryService, ExportService, PrintPdfEngine, VoucherService,
};
use crate::error::StoreResult;
use crate::storage::{FileConnection, SettingsRepository, VoucherRepository};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub counter_service: CounterService,
    pub voucher_service: VoucherService,
    pub data_directory_service: DataDirectoryService,
    pub export_service: ExportService,
}

/// The opened store. Closing flushes the voucher file; dropping closes too.
pub struct Backend {
    state: AppState,
    closed: AtomicBool,
}

impl Backend {
    /// Open (or create) the store in the configured data directory and seed counters
    pub fn open(config: &AppConfig) -> StoreResult<Self> {
        info!("Opening voucher store in {}", config.data_dir.display());
        let connection = FileConnection::new(&config.data_dir)?;

        let settings = Arc::new(SettingsRepository::new(connection.clone()));
        let vouchers = Arc::new(VoucherRepository::new(connection.clone()));

        let counter_service = CounterService::new(settings);
        counter_service.seed()?;

        let voucher_service = VoucherService::new(vouchers.clone(), counter_service.clone());
        let data_directory_service = DataDirectoryService::new(
            connection.base_directory().to_path_buf(),
            vouchers,
            counter_service.clone(),
        );
        let export_service = ExportService::new(voucher_service.clone(), Arc::new(PrintPdfEngine));

        Ok(Self {
            state: AppState {
                counter_service,
                voucher_service,
                data_directory_service,
                export_service,
            },
            closed: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Flush the store; later calls do nothing
    pub fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.state.data_directory_service.flush()?;
        info!("Voucher store closed");
        Ok(())
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to close voucher store: {}", e);
        }
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, shell_origin: &str) -> Router {
    let cors = match shell_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => {
            warn!(
                "Ignoring unusable shell origin {:?}; cross-origin calls are refused",
                shell_origin
            );
            CorsLayer::new()
        }
    }
    .allow_methods([Method::GET, Method::POST, Method::DELETE])
    .allow_headers(Any);

    Router::new()
        .nest("/api", io::rest::router())
        .layer(cors)
        .with_state(app_state)
}
