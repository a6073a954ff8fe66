//! Configuration management for the payslip portal
//!
//! Loads and validates the portal configuration from a YAML file. Every
//! section has defaults, so an empty file yields a runnable local setup.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the JSON API from a browser
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Record service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the record service
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Database name sent on login
    #[serde(default)]
    pub database: String,
    /// Service account login
    #[serde(default)]
    pub login: String,
    /// Service account password or API key
    #[serde(default)]
    pub password: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            database: String::new(),
            login: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8069".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Portal behaviour: which models to read and how users are identified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Model holding the selectable working years
    #[serde(default = "default_year_model")]
    pub year_model: String,
    /// Model holding payslips
    #[serde(default = "default_payslip_model")]
    pub payslip_model: String,
    /// Only payslips in this state are listed
    #[serde(default = "default_payslip_state")]
    pub payslip_state: String,
    /// Server-side method that returns the print action
    #[serde(default = "default_print_method")]
    pub print_method: String,
    /// Request header carrying the authenticated user id
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// User id used when the header is absent
    #[serde(default)]
    pub default_user_id: Option<i64>,
    /// Sessions unused for this long are dropped; 0 keeps them forever
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            year_model: default_year_model(),
            payslip_model: default_payslip_model(),
            payslip_state: default_payslip_state(),
            print_method: default_print_method(),
            user_header: default_user_header(),
            default_user_id: None,
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_year_model() -> String {
    "hr.working_year".to_string()
}

fn default_payslip_model() -> String {
    "hr.payslip".to_string()
}

fn default_payslip_state() -> String {
    "done".to_string()
}

fn default_print_method() -> String {
    "action_print_payslip".to_string()
}

fn default_user_header() -> String {
    "X-Portal-User".to_string()
}

fn default_session_idle_secs() -> u64 {
    1800
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_yaml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port must be greater than 0"));
        }

        let url = self.backend.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(
                "backend.url",
                "URL must start with http:// or https://",
            ));
        }

        if self.backend.timeout_secs == 0 {
            return Err(invalid(
                "backend.timeout_secs",
                "Timeout must be at least one second",
            ));
        }

        let required = [
            ("portal.year_model", &self.portal.year_model),
            ("portal.payslip_model", &self.portal.payslip_model),
            ("portal.payslip_state", &self.portal.payslip_state),
            ("portal.print_method", &self.portal.print_method),
            ("portal.user_header", &self.portal.user_header),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(invalid(field, "Value must not be empty"));
            }
        }

        Ok(())
    }

    /// Default configuration file contents
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ==================== Tests ====================
