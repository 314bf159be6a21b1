//! Host binary that renders last-commenter cells for SharePoint list rows.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use last_commenter_renderer::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Default to info-level logs; override via RUST_LOG if needed.
    logging::init_tracing("info");

    let cli = cli::Cli::parse();
    commands::run(cli).await
}
