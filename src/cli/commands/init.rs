//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "ambra.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing ambra configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your services URL", self.output);
                println!("  2. Set AMBRA_USERNAME and AMBRA_PASSWORD (or AMBRA_SID)");
                println!("  3. Validate configuration: ambra validate-config");
                println!("  4. Try a call: ambra call /session/user");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# ambra configuration file

[application]
log_level = "info"

[ambra]
url = "https://access.ambrahealth.com/api/v3"
username = "${AMBRA_USERNAME}"
password = "${AMBRA_PASSWORD}"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# ambra configuration file
#
# Every option with its default. Values of the form ${VAR} are read from
# the environment; AMBRA_* variables override the file.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Services API
# ============================================================================
[ambra]
# Base URL of the services API
url = "https://access.ambrahealth.com/api/v3"

# Storage API base; defaults to <scheme>://<host>/api/v3/storage
# storage_url = "https://storage.ambrahealth.com/api/v3/storage"

# Credentials, used to log in on first request and after the session expires
username = "${AMBRA_USERNAME}"
password = "${AMBRA_PASSWORD}"

# A pre-issued session id can be used instead of credentials
# sid = "${AMBRA_SID}"

# Account to log into when the user belongs to several
# account_id = "00000000-0000-0000-0000-000000000000"

# Request timeout in seconds
timeout_seconds = 60

# TLS certificate verification
tls_verify = true

# Rows per page for list calls (1-5000)
page_rows = 100

[ambra.retry]
# Attempts per request, including the first (1-20)
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

# ============================================================================
# WebSocket Channels
# ============================================================================
[websocket]
# Defaults to the services URL with ws(s):// and /channel/websocket
# url = "wss://access.ambrahealth.com/api/v3/channel/websocket"

# Seconds between pings
ping_interval_seconds = 30

# Reconnect attempts after the socket closes
reconnect_attempts = 3
reconnect_delay_ms = 1000

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local file logging
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"

# Console output as JSON
json = false
"#
        .to_string()
    }
}
