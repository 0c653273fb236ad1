//! Journeytrace CLI: the `journeytrace` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            logs,
            json,
            merge_window_ms,
            retry_threshold_ms,
            strict,
            allow_partial,
        } => commands::parse::run(commands::parse::Args {
            logs,
            json,
            merge_window_ms,
            retry_threshold_ms,
            strict,
            allow_partial,
        }),

        Commands::Inspect { logs, json } => commands::inspect::run(logs, json),
    }
}
