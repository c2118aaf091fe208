//! Verify board ordering.

use super::Context;
use crate::error::CliError;
use crate::store::load_board;

/// Check command handler
pub fn cmd_check(ctx: Context<'_>) -> Result<(), CliError> {
    let board = load_board(ctx.board)?;
    let violations = board.verify();
    if violations.is_empty() {
        println!(
            "OK: {} item(s) in {} column(s)",
            board.arrangement().total_items(),
            board.arrangement().partition_ids().count()
        );
        return Ok(());
    }

    for violation in &violations {
        eprintln!("  {violation}");
    }
    Err(CliError::Inconsistent(violations.len()))
}
