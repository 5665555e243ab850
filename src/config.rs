//! Persistent settings model and file-backed manager.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use jira_api::{Credentials, JiraConfig, DEFAULT_CONCURRENCY};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimesheetError};

fn default_max_concurrent_requests() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    jira_api::config::DEFAULT_TIMEOUT_SECS
}

/// Presentation switches for printed timesheets.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OutputOptions {
    /// One row per user and day.
    pub summarize: bool,
    /// Zero rows for days without effort.
    pub empty: bool,
    /// Decimal hours instead of duration text.
    pub decimal: bool,
    /// Negative decimal hours.
    pub negate: bool,
}

impl OutputOptions {
    pub fn validate(&self) -> Result<()> {
        if self.empty && !self.summarize {
            return Err(TimesheetError::Validation(
                "empty days can only be shown for a summarized timesheet".to_string(),
            ));
        }
        if self.negate && !self.decimal {
            return Err(TimesheetError::Validation(
                "negated durations require decimal output".to_string(),
            ));
        }
        Ok(())
    }
}

/// Represents the settings persisted on disk: Jira connection, default filters and output options.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    /// Talk plain HTTP instead of HTTPS.
    pub http: bool,
    pub username: String,
    pub password: String,
    pub projects: Vec<String>,
    /// `Name` or `Name=accountId` entries.
    pub users: Vec<String>,
    #[serde(flatten)]
    pub output: OutputOptions,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            http: false,
            username: String::new(),
            password: String::new(),
            projects: Vec::new(),
            users: Vec::new(),
            output: OutputOptions::default(),
            max_concurrent_requests: default_max_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Base URL derived from `host` and the `http` switch. A host that
    /// already carries a scheme is used as is.
    pub fn base_url(&self) -> Result<String> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(TimesheetError::Config("Jira host is not configured".to_string()));
        }
        if host.starts_with("http://") || host.starts_with("https://") {
            return Ok(host.to_string());
        }
        let scheme = if self.http { "http" } else { "https" };
        Ok(format!("{scheme}://{host}"))
    }

    pub fn jira_config(&self) -> Result<JiraConfig> {
        let credentials = Credentials::new(self.username.trim(), self.password.clone());
        if credentials.is_empty() {
            return Err(TimesheetError::Config("Jira username is not configured".to_string()));
        }
        Ok(JiraConfig::new(self.base_url()?, credentials)
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1))))
    }
}

/// Manages loading and saving of settings to a JSON file in the platform-specific config directory.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager bound to the platform-specific config path.
    pub fn new() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("org", "jira-timesheet", "jira-timesheet")
            .ok_or_else(|| {
                TimesheetError::Config("could not determine config directory".to_string())
            })?;
        Ok(Self::with_path(dirs.config_dir().join("config.json")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads config from disk, falling back to defaults on read/parse errors.
    pub fn load(&self) -> Config {
        if !self.path.exists() {
            return Config::default();
        }
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("Failed to read {}: {}", self.path.display(), err);
                return Config::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            log::warn!("Ignoring malformed config {}: {}", self.path.display(), err);
            Config::default()
        })
    }

    /// Persists config to disk, creating parent directories when needed.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)
            .map_err(|err| TimesheetError::Config(err.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
