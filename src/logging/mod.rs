//! Logging and observability
//!
//! The SDK logs through `tracing`. Applications install their own subscriber;
//! the `ambra` binary uses [`init_logging`].
//!
//! Credentials (`password`, `sid`) are never passed to a log macro.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an outgoing service call
///
/// # Example
///
/// ```no_run
/// use ambra_sdk::log_request;
///
/// log_request!("/study/list", 3);
/// ```
#[macro_export]
macro_rules! log_request {
    ($endpoint:expr, $param_count:expr) => {
        tracing::debug!(endpoint = %$endpoint, params = $param_count, "Calling Ambra service");
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use ambra_sdk::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection reset");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
