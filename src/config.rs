// src/config.rs
//
// Controller configuration, stored as JSON under the platform config dir
// with environment overrides for the two deployment URLs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::integrations::EngineConfig;

pub const PROXY_URL_ENV: &str = "ANIMEHUB_PROXY_URL";
pub const RECORD_STORE_URL_ENV: &str = "ANIMEHUB_RECORD_STORE_URL";

const CONFIG_FILE_NAME: &str = "player.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL of the m3u8 proxy (no trailing `/m3u8-proxy`)
    pub proxy_base_url: String,
    pub record_store_url: String,
    /// Seconds watched before a watch-history row is created
    pub min_watch_seconds: f64,
    /// Minimum spacing between periodic progress writes
    pub sync_interval_ms: u64,
    /// Delay between `ready` and the resume seek
    pub resume_settle_delay_ms: u64,
    /// Stored positions this close to the end are not resumed
    pub resume_tail_guard_seconds: f64,
    /// Skips that land on the end of the media stop this far before it
    pub outro_end_margin_seconds: f64,
    pub engine: EngineConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: "http://localhost:8080".to_string(),
            record_store_url: "http://127.0.0.1:8090".to_string(),
            min_watch_seconds: 10.0,
            sync_interval_ms: 10_000,
            resume_settle_delay_ms: 500,
            resume_tail_guard_seconds: 5.0,
            outro_end_margin_seconds: 0.1,
            engine: EngineConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn resume_settle_delay(&self) -> Duration {
        Duration::from_millis(self.resume_settle_delay_ms)
    }

    /// `<config dir>/animehub/player.json`
    pub fn default_path() -> AppResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| AppError::InvalidConfig("could not determine config directory".into()))?;
        Ok(dir.join("animehub").join(CONFIG_FILE_NAME))
    }

    /// Load from the default path, then apply environment overrides.
    pub fn load() -> AppResult<Self> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => {
                let config: ControllerConfig = serde_json::from_str(&data)?;
                info!("loaded player config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no player config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Override deployment URLs from `lookup` (normally the process env)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(PROXY_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.proxy_base_url = url;
        }
        if let Some(url) = lookup(RECORD_STORE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.record_store_url = url;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.proxy_base_url.trim().is_empty() {
            return Err(AppError::InvalidConfig("proxy_base_url is empty".into()));
        }
        if self.sync_interval_ms == 0 {
            return Err(AppError::InvalidConfig("sync_interval_ms must be positive".into()));
        }
        if !self.min_watch_seconds.is_finite() || self.min_watch_seconds < 0.0 {
            return Err(AppError::InvalidConfig(format!(
                "min_watch_seconds must be a non-negative number (got {})",
                self.min_watch_seconds
            )));
        }
        if !(0.0..1.0).contains(&self.outro_end_margin_seconds) {
            return Err(AppError::InvalidConfig(format!(
                "outro_end_margin_seconds must be in [0, 1) (got {})",
                self.outro_end_margin_seconds
            )));
        }
        Ok(())
    }
}
