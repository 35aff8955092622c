//! idegen CLI - turn flag descriptions into IDE project settings

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use idegen::util::diagnostic::{self, Diagnostic};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();
    let location = match &cli.command {
        Commands::Generate(args) => Some(args.description.clone()),
        _ => None,
    };

    if let Err(e) = run(cli, color) {
        let mut diag = Diagnostic::from_error(&e);
        if let Some(path) = location {
            diag = diag.with_location(path);
        }
        diagnostic::emit(&diag, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("idegen=debug")
    } else {
        EnvFilter::new("idegen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, color),
        Commands::Classify(args) => commands::classify::execute(args),
        Commands::Backends(args) => commands::backends::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
