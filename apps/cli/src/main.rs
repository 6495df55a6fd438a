//! patchdown CLI: render, inspect, and patch HTML content from the terminal.
//!
//! Reads an HTML file, builds its semantic index, and either prints it as
//! Markdown or applies a JSON delta payload to it.

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
