use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// FileConnection owns the data directory and the per-collection locks.
///
/// Clones share the same locks, so every repository built from one connection
/// serializes its reads and writes against the others.
#[derive(Clone)]
pub struct FileConnection {
    base_directory: PathBuf,
    vouchers_lock: Arc<Mutex<()>>,
    settings_lock: Arc<Mutex<()>>,
}

impl FileConnection {
    pub const VOUCHERS_FILE: &'static str = "vouchers.db";
    pub const SETTINGS_FILE: &'static str = "settings.yaml";

    /// Create a new connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> StoreResult<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
            vouchers_lock: Arc::new(Mutex::new(())),
            settings_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn vouchers_file_path(&self) -> PathBuf {
        self.base_directory.join(Self::VOUCHERS_FILE)
    }

    pub fn settings_file_path(&self) -> PathBuf {
        self.base_directory.join(Self::SETTINGS_FILE)
    }

    /// Create an empty file at `path` if there is none yet
    pub fn ensure_file_exists(&self, path: &Path) -> StoreResult<()> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, b"")?;
            debug!("Created empty data file {}", path.display());
        }
        Ok(())
    }

    pub(crate) fn lock_vouchers(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.vouchers_lock.lock().map_err(|_| StoreError::Lock)
    }

    pub(crate) fn lock_settings(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.settings_lock.lock().map_err(|_| StoreError::Lock)
    }

    /// Replace `path` with `contents` through a temp file and rename
    pub fn write_atomic(&self, path: &Path, contents: &[u8]) -> StoreResult<()> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
