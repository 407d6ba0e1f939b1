//! TutorGraph CLI: ask questions and get grounded answers with learning support.
//!
//! Answers come from a local corpus plus an LLM; a concept graph adds
//! prerequisites, related topics, and next steps, and answers can be checked
//! against academic, book, and web evidence.

mod commands;
mod render;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
