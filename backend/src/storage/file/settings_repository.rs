//! # Settings Repository
//!
//! File-based settings storage using a single YAML file `settings.yaml` at the
//! root of the data directory. Its only records today are the per-company
//! voucher counters.
//!
//! ## YAML Format
//!
//! ```yaml
//! data_format_version: "1.0"
//! counters:
//!   pv_counter_mentari: 8
//!   pv_counter_nes: 3
//! created_at: "2025-01-21T19:30:00Z"
//! updated_at: "2025-01-21T19:35:00Z"
//! ```
//!
//! A counter holds the NEXT number to hand out, never the last one used.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::Company;
use tracing::{debug, info, warn};

use super::connection::FileConnection;
use crate::error::StoreResult;
use crate::storage::traits::SettingsStorage;

/// Value every counter starts from
pub const COUNTER_START: u32 = 1;

/// Settings file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsFile {
    /// Data format version for future migrations
    pub data_format_version: String,
    /// `pv_counter_{company}` → next sequence number
    #[serde(default)]
    pub counters: BTreeMap<String, u32>,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for SettingsFile {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            data_format_version: "1.0".to_string(),
            counters: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Settings key of a company's counter
pub fn counter_key(company: Company) -> String {
    format!("pv_counter_{}", company.key())
}

#[derive(Clone)]
pub struct SettingsRepository {
    connection: FileConnection,
}

impl SettingsRepository {
    pub fn new(connection: FileConnection) -> Self {
        Self { connection }
    }

    fn settings_path(&self) -> PathBuf {
        self.connection.settings_file_path()
    }

    /// Load settings, falling back to an empty document if the file is missing or blank.
    /// The caller must hold the settings lock.
    fn load_settings(&self) -> StoreResult<SettingsFile> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsFile::default());
        }

        let yaml_content = fs::read_to_string(&path)?;
        if yaml_content.trim().is_empty() {
            return Ok(SettingsFile::default());
        }

        let settings: SettingsFile = serde_yaml::from_str(&yaml_content)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings; the caller must hold the settings lock
    fn save_settings(&self, settings: &mut SettingsFile) -> StoreResult<()> {
        settings.updated_at = Utc::now().to_rfc3339();
        let yaml_content = serde_yaml::to_string(settings)?;
        let path = self.settings_path();
        self.connection.write_atomic(&path, yaml_content.as_bytes())?;
        debug!("Saved settings to {:?}", path);
        Ok(())
    }
}

impl SettingsStorage for SettingsRepository {
    fn seed_counters(&self, companies: &[Company]) -> StoreResult<()> {
        let _guard = self.connection.lock_settings()?;
        let mut settings = self.load_settings()?;
        let mut seeded = Vec::new();

        for company in companies {
            let key = counter_key(*company);
            if !settings.counters.contains_key(&key) {
                settings.counters.insert(key.clone(), COUNTER_START);
                seeded.push(key);
            }
        }

        if !seeded.is_empty() || !self.settings_path().exists() {
            self.save_settings(&mut settings)?;
            info!("Seeded counters: {:?}", seeded);
        }
        Ok(())
    }

    fn next_counter(&self, company: Company) -> StoreResult<u32> {
        let _guard = self.connection.lock_settings()?;
        let mut settings = self.load_settings()?;
        let key = counter_key(company);

        let current = match settings.counters.get(&key) {
            Some(value) if *value >= COUNTER_START => *value,
            Some(value) => {
                warn!(
                    "Counter {} holds invalid value {}, restarting at {}",
                    key, value, COUNTER_START
                );
                COUNTER_START
            }
            None => {
                warn!("Counter {} missing, treating it as {}", key, COUNTER_START);
                COUNTER_START
            }
        };

        settings.counters.insert(key, current + 1);
        self.save_settings(&mut settings)?;
        Ok(current)
    }

    fn peek_counter(&self, company: Company) -> StoreResult<u32> {
        let _guard = self.connection.lock_settings()?;
        let settings = self.load_settings()?;
        Ok(settings
            .counters
            .get(&counter_key(company))
            .copied()
            .filter(|value| *value >= COUNTER_START)
            .unwrap_or(COUNTER_START))
    }

    fn clear_settings(&self) -> StoreResult<()> {
        let _guard = self.connection.lock_settings()?;
        let mut settings = self.load_settings().unwrap_or_default();
        settings.counters.clear();
        self.save_settings(&mut settings)?;
        info!("Cleared all settings records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::test_utils::TestEnvironment;
    use std::sync::Arc;
    use std::thread;

    fn setup_test_repo() -> (SettingsRepository, TestEnvironment) {
        let env = TestEnvironment::new().expect("Failed to create test environment");
        let repo = SettingsRepository::new(env.connection.clone());
        (repo, env)
    }

    #[test]
    fn test_seed_creates_counters_at_one() {
        let (repo, _env) = setup_test_repo();

        repo.seed_counters(&Company::ALL).unwrap();

        assert_eq!(repo.peek_counter(Company::Mentari).unwrap(), 1);
        assert_eq!(repo.peek_counter(Company::Nes).unwrap(), 1);
        let yaml = fs::read_to_string(repo.settings_path()).unwrap();
        assert!(yaml.contains("pv_counter_mentari: 1"));
        assert!(yaml.contains("pv_counter_nes: 1"));
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (repo, _env) = setup_test_repo();
        repo.seed_counters(&Company::ALL).unwrap();
        repo.next_counter(Company::Nes).unwrap();

        repo.seed_counters(&Company::ALL).unwrap();

        assert_eq!(repo.peek_counter(Company::Nes).unwrap(), 2);
    }

    #[test]
    fn test_next_counter_returns_pre_increment_value() {
        let (repo, _env) = setup_test_repo();
        repo.seed_counters(&Company::ALL).unwrap();

        assert_eq!(repo.next_counter(Company::Mentari).unwrap(), 1);
        assert_eq!(repo.next_counter(Company::Mentari).unwrap(), 2);
        assert_eq!(repo.peek_counter(Company::Mentari).unwrap(), 3);
        assert_eq!(repo.peek_counter(Company::Nes).unwrap(), 1);
    }

    #[test]
    fn test_missing_counter_self_heals() {
        let (repo, _env) = setup_test_repo();

        assert_eq!(repo.next_counter(Company::Nes).unwrap(), 1);
        assert_eq!(repo.next_counter(Company::Nes).unwrap(), 2);
    }

    #[test]
    fn test_clear_settings_drops_counters() {
        let (repo, _env) = setup_test_repo();
        repo.seed_counters(&Company::ALL).unwrap();
        repo.next_counter(Company::Mentari).unwrap();

        repo.clear_settings().unwrap();

        let settings = repo.load_settings().unwrap();
        assert!(settings.counters.is_empty());
    }

    #[test]
    fn test_counter_survives_restart() {
        let (repo, env) = setup_test_repo();
        repo.seed_counters(&Company::ALL).unwrap();
        repo.next_counter(Company::Mentari).unwrap();

        let connection2 = FileConnection::new(&env.base_path).unwrap();
        let repo2 = SettingsRepository::new(connection2);

        assert_eq!(repo2.peek_counter(Company::Mentari).unwrap(), 2);
    }

    #[test]
    fn test_concurrent_allocations_are_distinct() {
        let (repo, _env) = setup_test_repo();
        repo.seed_counters(&Company::ALL).unwrap();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    (0..5)
                        .map(|_| repo.next_counter(Company::Mentari).unwrap())
                        .collect::<Vec<u32>>()
                })
            })
            .collect();

        let mut values: Vec<u32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        values.sort_unstable();
        assert_eq!(values, (1..=40).collect::<Vec<u32>>());
    }
}
