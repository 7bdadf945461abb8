//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod call;
pub mod generate;
pub mod init;
pub mod listen;
pub mod validate;
