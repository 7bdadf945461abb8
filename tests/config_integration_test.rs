//! Integration tests for configuration loading and validation
//!
//! Tests that touch environment variables hold ENV_MUTEX.

use ambra_sdk::config::load_config;
use ambra_sdk::domain::AmbraError;
use ambra_sdk::Api;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "AMBRA_LOG_LEVEL",
        "AMBRA_URL",
        "AMBRA_PAGE_ROWS",
        "AMBRA_SID",
        "AMBRA_WEBSOCKET_URL",
        "TEST_AMBRA_PASSWORD",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"

[ambra]
url = "https://access.example.com/api/v3"
storage_url = "https://storage.example.com/api/v3/storage/"
username = "me@example.com"
password = "secret"
account_id = "acct-1"
timeout_seconds = 10
page_rows = 250

[ambra.retry]
max_retries = 5
initial_delay_ms = 100
max_delay_ms = 1000
backoff_multiplier = 3.0

[websocket]
ping_interval_seconds = 15
reconnect_attempts = 7
reconnect_delay_ms = 50

[logging]
local_enabled = false
local_rotation = "hourly"
json = true
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.ambra.account_id.as_deref(), Some("acct-1"));
    assert_eq!(config.ambra.page_rows, 250);
    assert_eq!(config.ambra.retry.max_retries, 5);
    assert_eq!(
        config.ambra.storage_base().unwrap(),
        "https://storage.example.com/api/v3/storage"
    );
    assert_eq!(config.websocket.reconnect_attempts, 7);
    assert_eq!(
        config.websocket_url().unwrap().as_str(),
        "wss://access.example.com/api/v3/channel/websocket"
    );
    assert!(config.logging.json);
}

#[test]
fn test_env_substitution_and_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_AMBRA_PASSWORD", "from-env");
    std::env::set_var("AMBRA_PAGE_ROWS", "42");
    std::env::set_var("AMBRA_WEBSOCKET_URL", "ws://localhost:9000/ws");

    let file = write_config(
        r#"
[ambra]
url = "https://access.example.com/api/v3"
username = "me@example.com"
password = "${TEST_AMBRA_PASSWORD}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    cleanup_env_vars();

    assert_eq!(config.ambra.password.as_ref().unwrap().expose_secret().as_str(), "from-env");
    assert_eq!(config.ambra.page_rows, 42);
    assert_eq!(
        config.websocket_url().unwrap().as_str(),
        "ws://localhost:9000/ws"
    );
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[ambra]
url = "https://access.example.com/api/v3"
username = "me@example.com"
password = "${TEST_AMBRA_PASSWORD}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, AmbraError::Configuration(ref m) if m.contains("TEST_AMBRA_PASSWORD")));
}

#[test]
fn test_sid_only_config_builds_api() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[ambra]
url = "https://access.example.com/api/v3"
sid = "pre-issued"
"#,
    );

    let config = load_config(file.path()).unwrap();
    let api = Api::from_config(&config).unwrap();
    assert_eq!(api.client().base_url(), "https://access.example.com/api/v3");
}

#[test]
fn test_invalid_values_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    for body in [
        "[application]\nlog_level = \"loud\"\n[ambra]\nurl = \"https://a.example.com\"\nsid = \"s\"\n",
        "[ambra]\nurl = \"https://a.example.com\"\nsid = \"s\"\npage_rows = 0\n",
        "[ambra]\nurl = \"https://a.example.com\"\nusername = \"me\"\n",
        "[ambra]\nurl = \"https://a.example.com\"\nsid = \"s\"\n[websocket]\nurl = \"http://nope\"\n",
    ] {
        let file = write_config(body);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            matches!(err, AmbraError::Configuration(_)),
            "expected configuration error for {body:?}"
        );
    }
}
