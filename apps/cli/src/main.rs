//! PitchLens CLI: run startup research from the terminal.
//!
//! Gathers a pitch deck, the company website and web research, structures
//! them with an LLM into a scored profile, and renders a PDF report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
