//! Call command implementation
//!
//! Posts to any services endpoint with `key=value` parameters and prints
//! the JSON response. With `--all` the endpoint is paged through and the
//! objects under `--result-key` are printed as one array.

use crate::api::Api;
use crate::cli::exit_code;
use crate::config::load_config;
use crate::domain::Result;
use crate::service::query::{ListFeatures, ListQuery, Query};
use clap::Args;
use serde_json::Value;

/// Arguments for the call command
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Endpoint path, e.g. /study/get
    pub endpoint: String,

    /// Request parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Page through the whole list
    #[arg(long, requires = "result_key")]
    pub all: bool,

    /// Response field holding the list, e.g. studies
    #[arg(long)]
    pub result_key: Option<String>,

    /// Stop after this many objects when paging
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

/// Parse a `key=value` argument
pub fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    format!("/{}", endpoint.trim().trim_matches('/'))
}

impl CallArgs {
    /// Execute the call command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let api = match Api::from_config(&config) {
            Ok(api) => api,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(exit_code(&e));
            }
        };

        let endpoint = normalize_endpoint(&self.endpoint);
        tracing::info!(endpoint = %endpoint, params = self.params.len(), "Calling endpoint");

        match self.send(&api, endpoint).await {
            Ok(body) => {
                let out = if self.compact {
                    serde_json::to_string(&body)?
                } else {
                    serde_json::to_string_pretty(&body)?
                };
                println!("{out}");
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Call failed");
                eprintln!("❌ {e}");
                Ok(exit_code(&e))
            }
        }
    }

    async fn send(&self, api: &Api, endpoint: String) -> Result<Value> {
        match (self.all, self.result_key.as_deref()) {
            (true, Some(result_key)) => {
                let mut query = ListQuery::new(
                    api.client().clone(),
                    endpoint,
                    result_key.to_string(),
                    ListFeatures::ALL,
                    &[],
                );
                for (key, value) in &self.params {
                    query = query.param(key, value);
                }
                if let Some(max) = self.max_results {
                    query = query.max_results(max);
                }
                Ok(Value::Array(query.all().await?))
            }
            _ => {
                let mut query = Query::new(api.client().clone(), endpoint, &[]);
                for (key, value) in &self.params {
                    query = query.param(key, value);
                }
                query.get().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("uuid=abc", Ok(("uuid", "abc")) ; "simple")]
    #[test_case("filter.name.like=%a=b%", Ok(("filter.name.like", "%a=b%")) ; "value with equals")]
    #[test_case("empty=", Ok(("empty", "")) ; "empty value")]
    #[test_case("novalue", Err(()) ; "missing equals")]
    #[test_case("=abc", Err(()) ; "missing key")]
    fn test_parse_key_value(raw: &str, expected: std::result::Result<(&str, &str), ()>) {
        let parsed = parse_key_value(raw);
        match expected {
            Ok((k, v)) => assert_eq!(parsed.unwrap(), (k.to_string(), v.to_string())),
            Err(()) => assert!(parsed.is_err()),
        }
    }

    #[test_case("/study/get", "/study/get")]
    #[test_case("study/get", "/study/get")]
    #[test_case(" /study/list/ ", "/study/list")]
    fn test_normalize_endpoint(raw: &str, expected: &str) {
        assert_eq!(normalize_endpoint(raw), expected);
    }
}
