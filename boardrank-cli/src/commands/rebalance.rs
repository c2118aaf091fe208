//! Renumber a column.

use boardrank_core::rebalance;
use tracing::info;

use super::Context;
use crate::error::CliError;
use crate::store::{load_board, save_board};
use crate::util::find_partition;

/// Rebalance command handler
pub fn cmd_rebalance(ctx: Context<'_>, partition: &str) -> Result<(), CliError> {
    let board = load_board(ctx.board)?;
    let partition = find_partition(&board, partition)?;
    let ids = board.arrangement().items(&partition).unwrap_or(&[]).to_vec();

    let ranks = rebalance(&ids);
    let next = board.with_changes(board.arrangement().clone(), ranks);
    save_board(ctx.board, &next)?;

    info!(%partition, count = ids.len(), "Rebalanced column");
    println!("Rebalanced {} item(s) in {partition}", ids.len());
    Ok(())
}
