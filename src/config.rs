//! Configuration loading and management
//!
//! Handles parsing of `.handover.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::DateRange;
use crate::error::{Error, Result};
use crate::shift::{default_shifts, Shift};

pub const CONFIG_FILE: &str = ".handover.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Report defaults
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Shift catalog
    #[serde(default = "default_shifts")]
    pub shifts: Vec<Shift>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            reports: ReportsConfig::default(),
            shifts: default_shifts(),
        }
    }
}

/// Backend-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Endpoint paths
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5443/shiftHandover".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_handovers_path")]
    pub handovers: String,

    #[serde(default = "default_history_path")]
    pub history: String,

    #[serde(default = "default_create_task_path")]
    pub create_task: String,

    #[serde(default = "default_update_task_path")]
    pub update_task: String,

    #[serde(default = "default_billing_path")]
    pub billing: String,
}

fn default_handovers_path() -> String {
    "/get_Handover/".to_string()
}

fn default_history_path() -> String {
    "/get_history/".to_string()
}

fn default_create_task_path() -> String {
    "/create_task/".to_string()
}

fn default_update_task_path() -> String {
    "/update_task/".to_string()
}

fn default_billing_path() -> String {
    "/get_billing/".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            handovers: default_handovers_path(),
            history: default_history_path(),
            create_task: default_create_task_path(),
            update_task: default_update_task_path(),
            billing: default_billing_path(),
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Range used when `report` is run without `--range` (7|30|90|all)
    #[serde(default = "default_range")]
    pub default_range: String,
}

fn default_range() -> String {
    "7".to_string()
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_range: default_range(),
        }
    }
}

impl ReportsConfig {
    pub fn range(&self) -> Result<DateRange> {
        self.default_range.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "reports.default_range '{}' (expected 7|30|90|all)",
                self.default_range
            ))
        })
    }
}

impl BackendConfig {
    fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "backend.base_url must start with http:// or https:// (got '{base}')"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "backend.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.timeout_secs > 600 {
            return Err(Error::InvalidConfig(
                "backend.timeout_secs must be <= 600".to_string(),
            ));
        }
        let endpoints = [
            ("handovers", &self.endpoints.handovers),
            ("history", &self.endpoints.history),
            ("create_task", &self.endpoints.create_task),
            ("update_task", &self.endpoints.update_task),
            ("billing", &self.endpoints.billing),
        ];
        for (name, path) in endpoints {
            if !path.trim().starts_with('/') {
                return Err(Error::InvalidConfig(format!(
                    "backend.endpoints.{name} must start with '/'"
                )));
            }
        }
        Ok(())
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim().trim_end_matches('/'), path.trim())
    }
}

impl Config {
    /// Load configuration from a `.handover.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults when the
    /// directory has no config file
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = Self::path_in(dir);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        self.reports.range()?;

        let mut seen = std::collections::HashSet::new();
        for shift in &self.shifts {
            shift
                .validate()
                .map_err(|err| Error::InvalidConfig(format!("shifts: {err}")))?;
            if !seen.insert(shift.id.trim().to_string()) {
                return Err(Error::InvalidConfig(format!(
                    "shifts has duplicate id '{}'",
                    shift.id
                )));
            }
        }
        Ok(())
    }
}
