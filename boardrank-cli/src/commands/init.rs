//! Create a board file.

use boardrank_core::Board;
use tracing::info;

use super::Context;
use crate::error::CliError;
use crate::store::save_board;
use crate::util::load_settings;

/// Init command handler
pub fn cmd_init(ctx: Context<'_>, partitions: &[String], force: bool) -> Result<(), CliError> {
    if ctx.board.exists() && !force {
        return Err(CliError::Board(format!(
            "{} already exists (use --force to overwrite)",
            ctx.board.display()
        )));
    }

    let partitions = if partitions.is_empty() {
        load_settings(ctx.config)?.default_partitions
    } else {
        partitions.to_vec()
    };
    if let Some(empty) = partitions.iter().find(|p| p.trim().is_empty()) {
        return Err(CliError::InvalidArgument(format!("Invalid column name '{empty}'")));
    }

    let board = Board::new(partitions.iter().map(String::as_str));
    save_board(ctx.board, &board)?;
    info!(path = %ctx.board.display(), columns = partitions.len(), "Board created");
    println!(
        "Created {} with columns: {}",
        ctx.board.display(),
        partitions.join(", ")
    );
    Ok(())
}
