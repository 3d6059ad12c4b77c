use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

use super::currency::CurrencyCode;
use super::rates::StoreStrategy;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SeedRate {
    pub code: CurrencyCode,
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub strategy: StoreStrategy,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    100
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            strategy: StoreStrategy::default(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_base_currency")]
    pub base_currency: CurrencyCode,
    #[serde(default = "default_rates")]
    pub rates: Vec<SeedRate>,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_base_currency() -> CurrencyCode {
    CurrencyCode::known("GBP")
}

fn default_rates() -> Vec<SeedRate> {
    vec![SeedRate {
        code: CurrencyCode::known("USD"),
        rate: Decimal::new(163380, 5),
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: default_base_currency(),
            rates: default_rates(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config at the default location, or the built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fxcache", "fxcache")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Seed list for the rate table, in configuration order.
    pub fn seed(&self) -> Vec<(CurrencyCode, Decimal)> {
        self.rates
            .iter()
            .map(|r| (r.code.clone(), r.rate))
            .collect()
    }
}
