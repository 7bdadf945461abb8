//! Configuration management.
//!
//! Configuration is a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `AMBRA_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [ambra]
//! url = "https://access.ambrahealth.com/api/v3"
//! username = "integration@example.com"
//! password = "${AMBRA_PASSWORD}"
//! page_rows = 100
//!
//! [ambra.retry]
//! max_retries = 3
//!
//! [websocket]
//! ping_interval_seconds = 30
//! reconnect_attempts = 3
//!
//! [logging]
//! local_enabled = false
//! ```
//!
//! ```rust,no_run
//! use ambra_sdk::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ambra.toml")?;
//! println!("Services API: {}", config.ambra.url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    derive_websocket_url, AmbraConfig, ApplicationConfig, LoggingConfig, RetryConfig,
    ServiceConfig, WebSocketConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
