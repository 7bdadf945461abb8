//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the ambra configuration file.

use crate::config::load_config;
use crate::config::AmbraConfig;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

/// How the client will authenticate, without revealing anything secret
fn auth_summary(config: &AmbraConfig) -> String {
    match (&config.ambra.sid, &config.ambra.username) {
        (Some(sid), _) if !sid.expose_secret().is_empty() => "session id".to_string(),
        (_, Some(username)) => format!("credentials ({username})"),
        _ => "none".to_string(),
    }
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as well
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        let storage = match config.ambra.storage_base() {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };
        let websocket = match config.websocket_url() {
            Ok(u) => u,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Services URL: {}", config.ambra.url);
        println!("  Storage URL: {storage}");
        println!("  WebSocket URL: {websocket}");
        println!("  Authentication: {}", auth_summary(&config));
        if let Some(ref account) = config.ambra.account_id {
            println!("  Account: {account}");
        }
        println!("  Page Rows: {}", config.ambra.page_rows);
        println!("  Timeout: {}s", config.ambra.timeout_seconds);
        println!("  Max Retries: {}", config.ambra.retry.max_retries);
        println!(
            "  Reconnect Attempts: {}",
            config.websocket.reconnect_attempts
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_auth_summary_prefers_sid() {
        let mut config = AmbraConfig::for_url("https://access.example.com/api/v3");
        config.ambra.username = Some("me@example.com".to_string());
        assert_eq!(auth_summary(&config), "credentials (me@example.com)");

        config.ambra.sid = Some(secret_string("sid-1".to_string()));
        assert_eq!(auth_summary(&config), "session id");
    }

    #[test]
    fn test_auth_summary_ignores_blank_sid() {
        let mut config = AmbraConfig::for_url("https://access.example.com/api/v3");
        config.ambra.sid = Some(secret_string("  ".to_string()));
        assert_eq!(auth_summary(&config), "none");

        config.ambra.username = Some("me@example.com".to_string());
        assert_eq!(auth_summary(&config), "credentials (me@example.com)");
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let args = ValidateArgs {};
        let code = args.execute("/nonexistent/ambra.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
