//! Configuration schema types

use crate::config::SecretString;
use crate::domain::{AmbraError, Result as AmbraResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Root configuration, maps to the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbraConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Services API connection
    pub ambra: ServiceConfig,

    /// WebSocket channel settings
    #[serde(default)]
    pub websocket: WebSocketConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AmbraConfig {
    /// Load, substitute, override and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> AmbraResult<Self> {
        super::loader::load_config(path)
    }

    /// Build a config for a URL and nothing else; credentials must be added
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            application: ApplicationConfig::default(),
            ambra: ServiceConfig {
                url: url.into(),
                ..ServiceConfig::default()
            },
            websocket: WebSocketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid setting
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.ambra.validate()?;
        self.websocket.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// WebSocket URL, either configured or derived from the services URL
    pub fn websocket_url(&self) -> AmbraResult<Url> {
        if let Some(ref url) = self.websocket.url {
            return Url::parse(url)
                .map_err(|e| AmbraError::Configuration(format!("Invalid websocket.url: {e}")));
        }
        derive_websocket_url(&self.ambra.url)
    }
}

/// Swap `http(s)` for `ws(s)` and point at `/channel/websocket` next to the
/// services path
pub fn derive_websocket_url(services_url: &str) -> AmbraResult<Url> {
    let mut url = Url::parse(services_url)
        .map_err(|e| AmbraError::Configuration(format!("Invalid ambra.url: {e}")))?;
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(AmbraError::Configuration(format!(
                "Cannot derive websocket url from scheme '{other}'"
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| AmbraError::Configuration("Cannot set websocket scheme".to_string()))?;
    let path = format!("{}/channel/websocket", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration for service calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exp);
        let delay_ms = if delay.is_finite() {
            (delay as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        };
        Duration::from_millis(delay_ms)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 20 {
            return Err(format!(
                "ambra.retry.max_retries must be between 1 and 20, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err("ambra.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err("ambra.retry.initial_delay_ms cannot exceed max_delay_ms".to_string());
        }
        Ok(())
    }
}

/// Services API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the services API, e.g. `https://access.ambrahealth.com/api/v3`
    pub url: String,

    /// Base URL of the Storage API; derived from `url` when absent
    #[serde(default)]
    pub storage_url: Option<String>,

    /// Login name
    #[serde(default)]
    pub username: Option<String>,

    /// Password, zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Pre-issued session id, used instead of credentials
    #[serde(default)]
    pub sid: Option<SecretString>,

    /// Account to log into when the user belongs to several
    #[serde(default)]
    pub account_id: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Default page size for list calls
    #[serde(default = "default_page_rows")]
    pub page_rows: usize,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            storage_url: None,
            username: None,
            password: None,
            sid: None,
            account_id: None,
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
            page_rows: default_page_rows(),
            retry: RetryConfig::default(),
        }
    }
}

impl ServiceConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.url.is_empty() {
            return Err("ambra.url cannot be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("ambra.url must start with http:// or https://".to_string());
        }
        if let Some(ref storage) = self.storage_url {
            if !storage.starts_with("http://") && !storage.starts_with("https://") {
                return Err("ambra.storage_url must start with http:// or https://".to_string());
            }
        }

        let has_sid = self
            .sid
            .as_ref()
            .map(|s| !s.expose_secret().is_empty())
            .unwrap_or(false);
        let has_username = self.username.as_ref().map(|u| !u.is_empty()).unwrap_or(false);
        let has_password = self
            .password
            .as_ref()
            .map(|p| !p.expose_secret().is_empty())
            .unwrap_or(false);

        if !has_sid {
            if !has_username {
                return Err("ambra.username is required when ambra.sid is not set".to_string());
            }
            if !has_password {
                return Err("ambra.password is required when ambra.sid is not set".to_string());
            }
        }

        if self.timeout_seconds == 0 {
            return Err("ambra.timeout_seconds must be > 0".to_string());
        }
        if !(1..=5000).contains(&self.page_rows) {
            return Err(format!(
                "ambra.page_rows must be between 1 and 5000, got {}",
                self.page_rows
            ));
        }
        self.retry.validate()?;
        Ok(())
    }

    /// Storage API base, either configured or `<scheme>://<host>/api/v3/storage`
    pub fn storage_base(&self) -> AmbraResult<String> {
        if let Some(ref storage) = self.storage_url {
            return Ok(storage.trim_end_matches('/').to_string());
        }
        let url = Url::parse(&self.url)
            .map_err(|e| AmbraError::Configuration(format!("Invalid ambra.url: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| AmbraError::Configuration("ambra.url has no host".to_string()))?;
        let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
        Ok(format!("{}://{}{}/api/v3/storage", url.scheme(), host, port))
    }
}

/// WebSocket channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// Channel endpoint; derived from `ambra.url` when absent
    #[serde(default)]
    pub url: Option<String>,

    /// Seconds between pings
    #[serde(default = "default_ping_interval_seconds")]
    pub ping_interval_seconds: u64,

    /// Reconnect attempts after the socket closes
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: usize,

    /// Delay between reconnect attempts in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: None,
            ping_interval_seconds: default_ping_interval_seconds(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl WebSocketConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err("websocket.url must start with ws:// or wss://".to_string());
            }
        }
        if self.ping_interval_seconds == 0 {
            return Err("websocket.ping_interval_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Console output as JSON
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_url() -> String {
    "https://access.ambrahealth.com/api/v3".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_page_rows() -> usize {
    100
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_ping_interval_seconds() -> u64 {
    30
}

fn default_reconnect_attempts() -> usize {
    3
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
