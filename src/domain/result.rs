//! Result type alias for the SDK

use super::errors::AmbraError;

/// Result type alias for SDK operations
///
/// # Examples
///
/// ```
/// use ambra_sdk::domain::result::Result;
/// use ambra_sdk::domain::errors::AmbraError;
///
/// fn failing_function() -> Result<()> {
///     Err(AmbraError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AmbraError>;
