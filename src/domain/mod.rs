//! Domain types shared by every layer of the SDK.
//!
//! # Overview
//!
//! - **Error types** ([`AmbraError`], [`ServiceError`], [`ErrorSpec`])
//! - **Result type alias** ([`Result`])
//! - **Identifiers** ([`Sid`])
//!
//! # Error Handling
//!
//! Every call against the Ambra services either returns the decoded JSON or a
//! [`ServiceError`] carrying the `error_type`/`error_subtype` pair:
//!
//! ```rust,no_run
//! use ambra_sdk::domain::{AmbraError, Result};
//!
//! # async fn example(api: &ambra_sdk::Api) -> Result<()> {
//! match api.study().get("3e1f8c9a-0000").get().await {
//!     Ok(study) => println!("{study}"),
//!     Err(AmbraError::Service(e)) if e.is("NOT_FOUND") => println!("no such study"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod result;

pub use errors::{AmbraError, ErrorSpec, ServiceError, ServiceErrorKind};
pub use ids::Sid;
pub use result::Result;
