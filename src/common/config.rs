use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cleaner::Quota;
use crate::common::errors::ReclaimError;
use crate::scanner::roots::ScanMode;
use crate::scanner::ScanConfig;

/// Allowed range for the size threshold slider, in MB
pub const MIN_THRESHOLD_MB: u64 = 10;
pub const MAX_THRESHOLD_MB: u64 = 1000;

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

/// Persisted user preferences and entitlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Minimum file size reported by a scan, in MB (10–1000)
    #[serde(default = "default_threshold_mb")]
    pub scan_threshold_mb: u64,

    /// Scan preset used when no roots are given
    #[serde(default)]
    pub default_mode: ScanMode,

    /// Paths or patterns never scanned
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Caches and temp files older than this are low risk
    #[serde(default = "default_stale_days")]
    pub stale_days: u32,

    /// Files modified within this many minutes are high risk
    #[serde(default = "default_in_use_minutes")]
    pub in_use_minutes: u32,

    /// Worker bound for scanning and deletion
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Whether the user holds a license
    #[serde(default)]
    pub licensed: bool,

    /// Per-session deletion cap when unlicensed, in GB
    #[serde(default = "default_trial_quota_gb")]
    pub trial_quota_gb: u64,
}

fn default_threshold_mb() -> u64 {
    100
}
fn default_stale_days() -> u32 {
    7
}
fn default_in_use_minutes() -> u32 {
    5
}
fn default_max_concurrency() -> usize {
    4
}
fn default_trial_quota_gb() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_threshold_mb: default_threshold_mb(),
            default_mode: ScanMode::default(),
            exclude_paths: Vec::new(),
            stale_days: default_stale_days(),
            in_use_minutes: default_in_use_minutes(),
            max_concurrency: default_max_concurrency(),
            licensed: false,
            trial_quota_gb: default_trial_quota_gb(),
        }
    }
}

impl Config {
    /// Get the reclaim data directory (~/.reclaim)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".reclaim")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load config from the default location, or defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents).map_err(|e| ReclaimError::Config {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        Ok(config.normalized())
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Clamp out-of-range values instead of rejecting the file
    pub fn normalized(mut self) -> Self {
        let clamped = self.scan_threshold_mb.clamp(MIN_THRESHOLD_MB, MAX_THRESHOLD_MB);
        if clamped != self.scan_threshold_mb {
            tracing::warn!(
                "scan_threshold_mb {} out of range, using {}",
                self.scan_threshold_mb,
                clamped
            );
            self.scan_threshold_mb = clamped;
        }
        if self.max_concurrency == 0 {
            tracing::warn!("max_concurrency 0 is invalid, using 1");
            self.max_concurrency = 1;
        }
        self
    }

    /// Update one key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "scan_threshold_mb" => self.scan_threshold_mb = value.parse()?,
            "default_mode" => {
                self.default_mode = match value {
                    "fast" => ScanMode::Fast,
                    "deep" => ScanMode::Deep,
                    _ => anyhow::bail!("default_mode must be 'fast' or 'deep'"),
                }
            }
            "stale_days" => self.stale_days = value.parse()?,
            "in_use_minutes" => self.in_use_minutes = value.parse()?,
            "max_concurrency" => self.max_concurrency = value.parse()?,
            "licensed" => self.licensed = value.parse()?,
            "trial_quota_gb" => self.trial_quota_gb = value.parse()?,
            "exclude_paths" => {
                self.exclude_paths = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        let normalized = self.clone().normalized();
        *self = normalized;
        Ok(())
    }

    /// Minimum file size in bytes
    pub fn min_size_bytes(&self) -> u64 {
        self.scan_threshold_mb.clamp(MIN_THRESHOLD_MB, MAX_THRESHOLD_MB) * MB
    }

    /// Deletion quota granted by the current entitlement
    pub fn quota(&self) -> Quota {
        Quota::from_entitlement(self.licensed, self.trial_quota_gb.saturating_mul(GB))
    }

    /// Build the engine configuration for one scan
    pub fn scan_config(&self, mode: ScanMode) -> ScanConfig {
        ScanConfig {
            mode,
            min_size_bytes: self.min_size_bytes(),
            stale_window: Duration::from_secs(self.stale_days as u64 * 86400),
            in_use_window: Duration::from_secs(self.in_use_minutes as u64 * 60),
            exclude_patterns: self.exclude_paths.clone(),
            max_concurrency: self.max_concurrency.max(1),
        }
    }
}
