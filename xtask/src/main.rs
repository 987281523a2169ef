//! headglass workspace checks.
//!
//! # Commands
//!
//! - `cargo xtask check` - Run every check, report failures
//! - `cargo xtask check --ci` - Same, exit non-zero on any failure
//! - `cargo xtask ci` - Full CI suite, step by step
//!
//! # Checks
//!
//! 1. Formatting - `cargo fmt --check`
//! 2. Clippy - zero warnings with the workspace lint set
//! 3. Tests - every crate, unit and integration
//! 4. Documentation - zero rustdoc warnings
//! 5. Safety - no `unwrap()`/`expect()` outside test modules

mod check;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// headglass workspace checks
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Quality checks for the headglass workspace", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all quality checks across the workspace
    Check {
        /// Fail the process if any check fails
        #[arg(long)]
        ci: bool,
    },

    /// Run the full CI suite
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { ci } => check::run(ci),
        Commands::Ci => check::run_ci(),
    }
}
