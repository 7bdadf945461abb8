//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the `ambra` binary
//! using clap.

pub mod commands;

use crate::domain::AmbraError;
use clap::{Parser, Subcommand};

/// Ambra Health API command-line client
#[derive(Parser, Debug)]
#[command(name = "ambra")]
#[command(version, about, long_about = None)]
#[command(author = "Ambra SDK Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ambra.toml", env = "AMBRA_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "AMBRA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call a services endpoint and print the JSON response
    Call(commands::call::CallArgs),

    /// Subscribe to a WebSocket channel and print its events
    Listen(commands::listen::ListenArgs),

    /// Generate entrypoint modules from the HTML API reference
    Generate(commands::generate::GenerateArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Process exit code for an error
///
/// 2 for configuration problems, 3 for anything the service or the
/// connection to it reported, 5 otherwise.
pub fn exit_code(err: &AmbraError) -> i32 {
    match err {
        AmbraError::Configuration(_) => 2,
        AmbraError::Service(_)
        | AmbraError::Authentication(_)
        | AmbraError::Connection(_)
        | AmbraError::Interrupted(_)
        | AmbraError::WebSocket(_)
        | AmbraError::Validation(_) => 3,
        _ => 5,
    }
}
