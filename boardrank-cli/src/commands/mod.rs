//! Command handler modules for the CLI.

mod add;
mod check;
mod completions;
mod init;
mod manpage;
mod move_item;
mod rank;
mod rebalance;
mod show;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Paths shared by every command
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Board file
    pub board: &'a Path,
    /// Optional configuration directory
    pub config: Option<&'a Path>,
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(ctx: Context<'_>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Init { partitions, force } => init::cmd_init(ctx, &partitions, force),
        Commands::Add { id, partition } => add::cmd_add(ctx, id.as_deref(), &partition),
        Commands::Show { format, partition } => {
            show::cmd_show(ctx, format, partition.as_deref())
        }
        Commands::Move(args) => move_item::cmd_move(ctx, &args),
        Commands::Rank(subcmd) => rank::cmd_rank(subcmd),
        Commands::Rebalance { partition } => rebalance::cmd_rebalance(ctx, &partition),
        Commands::Check => check::cmd_check(ctx),
        Commands::Completions { shell } => completions::cmd_completions(shell),
        Commands::Manpage => manpage::cmd_manpage(),
    }
}
