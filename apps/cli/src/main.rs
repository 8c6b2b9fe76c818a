//! knowledgepack CLI: consolidate a personal knowledge corpus.
//!
//! Reads classified fragments, isolates named frameworks, merges everything
//! into a bounded set of upload-ready documents and writes them to disk.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
