//! # Runtime Configuration
//!
//! Resolved once at startup from environment variables:
//!
//! | variable              | default                                  |
//! |-----------------------|------------------------------------------|
//! | `VOUCHER_DATA_DIR`    | `<platform data dir>/Payment Voucher`    |
//! | `VOUCHER_BIND_ADDR`   | `127.0.0.1:3000`                         |
//! | `VOUCHER_SHELL_ORIGIN`| `http://localhost:8080`                  |
//!
//! When no directory is given explicitly, a `.voucher_redirect` file in the
//! default directory may point the store somewhere else.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{error, info, warn};

pub const DATA_DIR_VAR: &str = "VOUCHER_DATA_DIR";
pub const BIND_ADDR_VAR: &str = "VOUCHER_BIND_ADDR";
pub const SHELL_ORIGIN_VAR: &str = "VOUCHER_SHELL_ORIGIN";

pub const APP_DIR_NAME: &str = "Payment Voucher";
pub const REDIRECT_FILE: &str = ".voucher_redirect";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SHELL_ORIGIN: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Only origin allowed to call the API from a browser context
    pub shell_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = match value(DATA_DIR_VAR) {
            Some(dir) => {
                info!("Using data directory from {}: {}", DATA_DIR_VAR, dir);
                PathBuf::from(dir)
            }
            None => resolve_redirect(&default_data_dir()?),
        };

        let bind_text = value(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_text
            .parse()
            .with_context(|| format!("Invalid {}: {}", BIND_ADDR_VAR, bind_text))?;
        if !bind_addr.ip().is_loopback() {
            warn!("Binding to non-loopback address {}; the API has no authentication", bind_addr);
        }

        let shell_origin =
            value(SHELL_ORIGIN_VAR).unwrap_or_else(|| DEFAULT_SHELL_ORIGIN.to_string());

        Ok(Self {
            data_dir,
            bind_addr,
            shell_origin,
        })
    }
}

/// `<platform data dir>/Payment Voucher`, falling back to the home directory
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("Could not determine a data directory"))
}

/// Follow a redirect file in `default_dir` if it names an existing directory
pub fn resolve_redirect(default_dir: &Path) -> PathBuf {
    let redirect_file = default_dir.join(REDIRECT_FILE);
    if !redirect_file.exists() {
        info!("No redirect file found, using default data directory: {}", default_dir.display());
        return default_dir.to_path_buf();
    }

    match fs::read_to_string(&redirect_file) {
        Ok(content) => {
            let redirected = PathBuf::from(content.trim());
            if redirected.is_dir() {
                info!("Found redirect file, using data directory: {}", redirected.display());
                redirected
            } else {
                warn!(
                    "Redirect file points to non-existent directory: {}. Using default.",
                    redirected.display()
                );
                default_dir.to_path_buf()
            }
        }
        Err(e) => {
            error!("Failed to read redirect file: {}. Using default directory.", e);
            default_dir.to_path_buf()
        }
    }
}
