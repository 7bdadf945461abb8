// ambra-sdk - Ambra Health services SDK
// Copyright (c) 2025 Ambra SDK Contributors
// Licensed under the MIT License

//! # ambra-sdk
//!
//! Client for the Ambra Health services API, Storage API and WebSocket
//! channels.
//!
//! ## Overview
//!
//! - **Calling** services endpoints as form POSTs with session handling,
//!   retries and documented error mapping
//! - **Paging** through list endpoints with filters, sorting and field
//!   selection
//! - **Subscribing** to WebSocket channels with automatic reconnects
//! - **Generating** entrypoint modules from the HTML API reference
//!
//! ## Architecture
//!
//! - [`api`] - The [`Api`] facade with one accessor per namespace
//! - [`service`] - Transport, sessions, queries, storage and channels
//! - [`codegen`] - HTML reference to Rust source generator
//! - [`cli`] - Command-line interface of the `ambra` binary
//! - [`domain`] - Error types and identifiers
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ambra_sdk::service::Field;
//! use ambra_sdk::Api;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Api::with_creds(
//!         "https://access.ambrahealth.com/api/v3",
//!         "me@example.com",
//!         "secret",
//!     )?;
//!
//!     let studies = api
//!         .study()
//!         .list()
//!         .filter_by(Field::new("patient_name").like("%DOE%"))
//!         .sort_by(Field::new("created").desc())
//!         .max_results(50)
//!         .all()
//!         .await?;
//!
//!     println!("Found {} studies", studies.len());
//!     api.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`domain::Result`]. Service failures carry the
//! HTTP status, the `error_type` from the response and the description
//! documented for that endpoint:
//!
//! ```rust,no_run
//! use ambra_sdk::domain::{AmbraError, ServiceErrorKind};
//!
//! # async fn example(api: ambra_sdk::Api) {
//! match api.study().get("missing").get().await {
//!     Err(AmbraError::Service(e)) if e.kind == ServiceErrorKind::NotFound => {
//!         println!("no such study: {}", e.description.unwrap_or_default());
//!     }
//!     other => println!("{other:?}"),
//! }
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod domain;
pub mod logging;
pub mod service;

pub use api::Api;
