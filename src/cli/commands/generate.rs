//! Generate command implementation
//!
//! Turns the HTML API reference into entrypoint modules.

use crate::cli::exit_code;
use crate::codegen;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// HTML API reference
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for the generated modules
    #[arg(short, long, default_value = "generated")]
    pub output: PathBuf,
}

impl GenerateArgs {
    /// Execute the generate command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        println!("🛠️  Generating entrypoints from {}", self.input.display());
        println!();

        match codegen::generate(&self.input, &self.output) {
            Ok(summary) => {
                println!("✅ Generated {} endpoints", summary.endpoints);
                println!("   Namespaces: {}", summary.namespaces);
                if summary.skipped > 0 {
                    println!("   Skipped sections: {}", summary.skipped);
                }
                for file in &summary.files {
                    println!("   {}", file.display());
                }
                println!();
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Generation failed");
                println!("❌ Generation failed");
                println!("   Error: {e}");
                Ok(exit_code(&e))
            }
        }
    }
}
