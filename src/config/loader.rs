//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::AmbraConfig;
use super::secret::secret_string;
use crate::domain::errors::AmbraError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`AmbraConfig`]
/// 4. Applies environment variable overrides (`AMBRA_*` prefix)
/// 5. Validates the configuration
///
/// # Examples
///
/// ```no_run
/// use ambra_sdk::config::loader::load_config;
///
/// let config = load_config("ambra.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AmbraConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AmbraError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AmbraError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Same as [`load_config`] for an in-memory document
pub fn parse_config(contents: &str) -> Result<AmbraConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AmbraConfig = toml::from_str(&contents)
        .map_err(|e| AmbraError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        AmbraError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied unchanged. Every missing variable is reported in
/// one error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(AmbraError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `AMBRA_` prefix
///
/// Variables follow `AMBRA_<SECTION>_<KEY>`, e.g. `AMBRA_URL`,
/// `AMBRA_WEBSOCKET_URL`. Values that fail to parse are ignored.
fn apply_env_overrides(config: &mut AmbraConfig) {
    if let Ok(val) = std::env::var("AMBRA_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("AMBRA_URL") {
        config.ambra.url = val;
    }
    if let Ok(val) = std::env::var("AMBRA_STORAGE_URL") {
        config.ambra.storage_url = Some(val);
    }
    if let Ok(val) = std::env::var("AMBRA_USERNAME") {
        config.ambra.username = Some(val);
    }
    if let Ok(val) = std::env::var("AMBRA_PASSWORD") {
        config.ambra.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("AMBRA_SID") {
        config.ambra.sid = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("AMBRA_ACCOUNT_ID") {
        config.ambra.account_id = Some(val);
    }
    if let Ok(val) = std::env::var("AMBRA_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.ambra.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("AMBRA_PAGE_ROWS") {
        if let Ok(rows) = val.parse() {
            config.ambra.page_rows = rows;
        }
    }
    if let Ok(val) = std::env::var("AMBRA_TLS_VERIFY") {
        config.ambra.tls_verify = val.parse().unwrap_or(true);
    }

    if let Ok(val) = std::env::var("AMBRA_WEBSOCKET_URL") {
        config.websocket.url = Some(val);
    }
    if let Ok(val) = std::env::var("AMBRA_WEBSOCKET_PING_INTERVAL_SECONDS") {
        if let Ok(interval) = val.parse() {
            config.websocket.ping_interval_seconds = interval;
        }
    }

    if let Ok(val) = std::env::var("AMBRA_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("AMBRA_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
