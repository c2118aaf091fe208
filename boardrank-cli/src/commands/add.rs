//! Add an item to a column.

use std::sync::Arc;

use boardrank_core::{ItemId, ReorderReconciler};

use super::Context;
use crate::error::CliError;
use crate::store::JsonBoardStore;
use crate::util::{find_partition, reconciler_config, runtime};

/// Add command handler
pub fn cmd_add(ctx: Context<'_>, id: Option<&str>, partition: &str) -> Result<(), CliError> {
    let store = Arc::new(JsonBoardStore::open(ctx.board)?);
    let config = reconciler_config(ctx.config)?;
    let item_id = id.map_or_else(|| ItemId::new(uuid::Uuid::new_v4().to_string()), ItemId::from);

    let outcome = runtime()?.block_on(async {
        let board = store.snapshot().await;
        let partition = find_partition(&board, partition)?;
        let reconciler = ReorderReconciler::new(board, store.clone(), config);
        reconciler
            .create_item(item_id.clone(), partition)
            .await
            .map_err(CliError::from)
    })?;

    if let Some(payload) = outcome.payload() {
        println!(
            "Added {} to {} with rank {}",
            payload.item_id, payload.partition, payload.rank
        );
    }
    Ok(())
}
