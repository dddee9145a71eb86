//! Configuration system for Threadlog.

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default document id of the action log query.
pub const DEFAULT_ACTION_LOG_DOC_ID: &str = "1547392382048831";

/// Main configuration struct for Threadlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote service settings
    pub client: ClientConfig,
    /// Pagination and streaming settings
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service base URL
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Document id of the action log query
    pub action_log_doc_id: String,
    /// Session cookie (set directly or via `cookie_env`)
    pub cookie: Option<String>,
    /// Environment variable holding the session cookie
    pub cookie_env: Option<String>,
    /// Form parameters sent with every request (session tokens etc.)
    pub form_params: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.messenger.com".to_string(),
            user_agent: concat!("threadlog/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            action_log_doc_id: DEFAULT_ACTION_LOG_DOC_ID.to_string(),
            cookie: None,
            cookie_env: None,
            form_params: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Resolve the cookie from either direct value or environment variable.
    pub fn resolve_cookie(&self) -> Option<String> {
        if let Some(ref cookie) = self.cookie {
            return Some(cookie.clone());
        }
        if let Some(ref env_var) = self.cookie_env {
            if let Ok(cookie) = std::env::var(env_var) {
                return Some(cookie);
            }
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Actions requested per page
    pub page_size: usize,
    /// Actions buffered between the fetch task and the consumer
    pub buffer_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            buffer_capacity: 500,
        }
    }
}

/// Validation result with multiple issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Check if validation passed (no errors).
    pub fn is_ok(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == IssueSeverity::Error)
    }

    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == IssueSeverity::Error).collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == IssueSeverity::Warning).collect()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        });
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Field path (e.g., "history.page_size")
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Warnings don't prevent loading
    Warning,
    /// Errors prevent loading
    Error,
}

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, figment::Error> {
        let config_dir = Self::config_dir();

        Figment::new()
            .merge(figment::providers::Serialized::defaults(Config::default()))
            // User config
            .merge(Toml::file(config_dir.join("config.toml")))
            // Project config
            .merge(Toml::file(".threadlog/config.toml"))
            // Project local config (gitignored, usually holds the cookie)
            .merge(Toml::file(".threadlog/config.local.toml"))
            .merge(Env::prefixed("THREADLOG_").split("__"))
            .extract()
    }

    /// Load and validate configuration.
    pub fn load_validated() -> Result<Self, Error> {
        let config = Self::load().map_err(|e| Error::Config(e.to_string()))?;
        let result = config.validate();

        if !result.is_ok() {
            let errors: Vec<String> = result
                .errors()
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return Err(Error::Config(format!(
                "Configuration validation failed:\n  {}",
                errors.join("\n  ")
            )));
        }

        for warning in result.warnings() {
            tracing::warn!("Config warning - {}: {}", warning.field, warning.message);
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !self.client.base_url.starts_with("http://") && !self.client.base_url.starts_with("https://") {
            result.add_error("client.base_url", "base_url must start with http:// or https://");
        }

        if self.client.timeout_secs == 0 {
            result.add_error("client.timeout_secs", "timeout_secs must be greater than 0");
        }

        if self.client.action_log_doc_id.is_empty() {
            result.add_error("client.action_log_doc_id", "action_log_doc_id cannot be empty");
        }

        if self.client.cookie.as_ref().map(|c| c.is_empty()).unwrap_or(false) {
            result.add_warning("client.cookie", "cookie is empty string");
        }

        if self.history.page_size == 0 {
            result.add_error("history.page_size", "page_size must be greater than 0");
        } else if self.history.page_size > 1000 {
            result.add_warning("history.page_size", "page_size is very high (> 1000), the server may truncate pages");
        }

        if self.history.buffer_capacity == 0 {
            result.add_error("history.buffer_capacity", "buffer_capacity must be greater than 0");
        } else if self.history.buffer_capacity < self.history.page_size {
            result.add_warning(
                "history.buffer_capacity",
                "buffer_capacity is smaller than page_size; fetching will stall on a slow consumer",
            );
        }

        result
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Get the configuration directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("threadlog"))
            .unwrap_or_else(|| PathBuf::from("~/.config/threadlog"))
    }
}
