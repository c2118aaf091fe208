//! `BoardRank` CLI - Command-line interface for `BoardRank` boards
//!
//! Provides commands for creating boards, adding and moving items, inspecting
//! and rebalancing ranks, and checking a board file for ordering problems.

mod cli;
mod commands;
mod error;
mod store;
mod util;

use boardrank_core::tracing::{TracingConfig, TracingLevel, init_tracing};
use clap::Parser;
use cli::Cli;
use commands::Context;

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        TracingLevel::from_verbosity(cli.verbose)
    };
    if let Err(e) = init_tracing(&TracingConfig::new().with_level(level)) {
        eprintln!("[tracing disabled: {e}]");
    }

    let ctx = Context {
        board: &cli.board,
        config: cli.config.as_deref(),
    };
    let result = commands::dispatch(ctx, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {}", e.user_message());
        }
        std::process::exit(e.exit_code());
    }
}
