//! Binary crate for the `locus` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Asking for location consent and interactive configuration
//! - Rendering the loading, error and map views in the terminal

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod consent;
mod render;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with JSON on stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
