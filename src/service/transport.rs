//! HTTP transport for the services and Storage APIs
//!
//! [`HttpTransport`] sends one logical request, retrying connection failures,
//! 5xx and 429 responses with exponential backoff. A services POST is only
//! sent again after a failure to connect; a timeout or a dropped reply may
//! mean the server already applied it. It knows nothing about sessions;
//! [`ServiceClient`](super::ServiceClient) adds the `sid`.

use crate::config::{RetryConfig, ServiceConfig};
use crate::domain::{AmbraError, ErrorSpec, Result, ServiceError};
use crate::{log_request, log_retry_attempt};
use rand::Rng;
use reqwest::{Client, ClientBuilder, Method, Response};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Form/query parameters in send order; keys may repeat
pub type Params = Vec<(String, String)>;

/// Low-level HTTP sender
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Build a transport from the services config
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the TLS backend cannot be initialised.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("ambra-sdk-rust/", env!("CARGO_PKG_VERSION")));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| AmbraError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
        })
    }

    /// Services base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy in use
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// POST form-encoded `params` to `<base><path>` and decode the JSON reply
    pub async fn post_form(
        &self,
        path: &str,
        params: &Params,
        errors: &'static [ErrorSpec],
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        log_request!(path, params.len());

        self.retry_request(|| async {
            let response = self
                .http
                .post(&url)
                .form(params)
                .send()
                .await
                .map_err(|e| send_error(e, false))?;
            decode_service_response(path, response, errors).await
        })
        .await
    }

    /// Send a Storage API request to an absolute URL
    pub async fn storage_request(
        &self,
        method: Method,
        url: &str,
        query: &Params,
    ) -> Result<Value> {
        tracing::debug!(method = %method, url = %url, "Calling Ambra storage");

        self.retry_request(|| async {
            let response = self
                .http
                .request(method.clone(), url)
                .query(query)
                .send()
                .await
                .map_err(|e| send_error(e, method.is_idempotent()))?;
            decode_storage_response(url, response).await
        })
        .await
    }

    /// Retry an operation with exponential backoff and jitter
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_retries = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries || !e.is_retryable() {
                        return Err(e);
                    }

                    let base = self.retry.delay_for(attempt);
                    let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 4);
                    let delay = base + Duration::from_millis(jitter_ms);

                    log_retry_attempt!(attempt, max_retries, e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Classify a failed send; only idempotent requests survive a lost reply
fn send_error(err: reqwest::Error, idempotent: bool) -> AmbraError {
    if idempotent || err.is_connect() {
        AmbraError::Connection(err.to_string())
    } else {
        AmbraError::Interrupted(err.to_string())
    }
}

/// Turn a services response into JSON or a [`ServiceError`]
///
/// A 2xx reply whose body says `"status": "ERROR"` is still an error.
async fn decode_service_response(
    path: &str,
    response: Response,
    errors: &'static [ErrorSpec],
) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AmbraError::Connection(e.to_string()))?;
    let body: Option<Value> = serde_json::from_str(&text).ok();

    if status.is_success() {
        let body = body.ok_or_else(|| {
            AmbraError::Serialization(format!("{path} returned a non-JSON body"))
        })?;
        if body.get("status").and_then(Value::as_str) == Some("ERROR") {
            return Err(ServiceError::from_response(path, status.as_u16(), Some(&body), errors).into());
        }
        return Ok(body);
    }

    let err = ServiceError::from_response(path, status.as_u16(), body.as_ref(), errors);
    tracing::debug!(
        endpoint = %path,
        status = status.as_u16(),
        error_type = err.error_type.as_deref().unwrap_or("-"),
        "Ambra service returned an error"
    );
    Err(err.into())
}

async fn decode_storage_response(url: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AmbraError::Connection(e.to_string()))?;

    if !status.is_success() {
        let body: Option<Value> = serde_json::from_str(&text).ok();
        let path = url.split('?').next().unwrap_or(url);
        return Err(ServiceError::from_response(path, status.as_u16(), body.as_ref(), &[]).into());
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
