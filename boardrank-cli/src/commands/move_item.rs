//! Move an item within or across columns.

use std::sync::Arc;

use boardrank_core::{
    Board, CommitOutcome, DropTarget, MoveIntent, ReorderReconciler, intent_for_drop,
};

use super::Context;
use crate::cli::MoveArgs;
use crate::error::CliError;
use crate::store::JsonBoardStore;
use crate::util::{find_item, find_partition, reconciler_config, runtime};

/// Move command handler
pub fn cmd_move(ctx: Context<'_>, args: &MoveArgs) -> Result<(), CliError> {
    let store = Arc::new(JsonBoardStore::open(ctx.board)?);
    let config = reconciler_config(ctx.config)?;
    let rt = runtime()?;

    let board = rt.block_on(store.snapshot());
    let intent = build_intent(&board, args)?;
    let reconciler = ReorderReconciler::new(board, store, config);

    match rt.block_on(reconciler.commit_move(intent))? {
        CommitOutcome::Unchanged => println!("Nothing to do: item is already there"),
        CommitOutcome::Committed { payload, .. } => {
            let placed = reconciler
                .board()
                .arrangement()
                .locate(&payload.item_id)
                .map_or(0, |(_, index)| index);
            println!(
                "Moved {} to {}[{}] with rank {}",
                payload.item_id, payload.partition, placed, payload.rank
            );
            if !payload.rebalanced.is_empty() {
                println!(
                    "Rebalanced {} other item(s) in {}",
                    payload.rebalanced.len(),
                    payload.partition
                );
            }
        }
    }
    Ok(())
}

/// Turns the command arguments into a move intent
fn build_intent(board: &Board, args: &MoveArgs) -> Result<MoveIntent, CliError> {
    let item = find_item(board, &args.item)?;

    let anchor = match (&args.before, &args.after) {
        (Some(before), _) => Some(DropTarget::before(find_item(board, before)?)),
        (None, Some(after)) => Some(DropTarget::after(find_item(board, after)?)),
        (None, None) => None,
    };
    if let Some(target) = anchor {
        let intent = intent_for_drop(board.arrangement(), &item, &target)
            .ok_or_else(|| CliError::ItemNotFound(args.item.clone()))?;
        if let Some(partition) = &args.partition {
            let named = find_partition(board, partition)?;
            if named != intent.target {
                return Err(CliError::InvalidArgument(format!(
                    "Anchor item is not in column {named}"
                )));
            }
        }
        return Ok(intent);
    }

    let Some((source, _)) = board.arrangement().locate(&item) else {
        return Err(CliError::ItemNotFound(args.item.clone()));
    };
    let target = match &args.partition {
        Some(partition) => find_partition(board, partition)?,
        None => source.clone(),
    };
    let index = match args.index {
        Some(index) => index,
        None => intent_for_drop(board.arrangement(), &item, &DropTarget::Column(target.clone()))
            .map_or(0, |intent| intent.target_index),
    };
    Ok(MoveIntent::new(item.clone(), source.clone(), target, index))
}
