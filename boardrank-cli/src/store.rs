//! File-backed persistence for boards.
//!
//! The board lives in one pretty-printed JSON file. [`JsonBoardStore`]
//! implements the engine's persistence boundary on top of it, so CLI moves
//! go through the same optimistic commit path as any other client.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use boardrank_core::{
    Board, ChangePayload, Confirmation, ItemId, PersistError, PersistenceBoundary, RankKey,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::CliError;

/// Reads a board file
pub fn load_board(path: &Path) -> Result<Board, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::Board(format!("Failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Board(format!("Failed to parse {}: {e}", path.display())))
}

/// Writes a board file
pub fn save_board(path: &Path, board: &Board) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(board)
        .map_err(|e| CliError::Board(format!("Failed to serialize board: {e}")))?;
    std::fs::write(path, text)
        .map_err(|e| CliError::Board(format!("Failed to write {}: {e}", path.display())))
}

/// Persistence boundary writing the board to a JSON file
pub struct JsonBoardStore {
    path: PathBuf,
    stored: Mutex<Board>,
}

impl JsonBoardStore {
    /// Creates a store over `path` whose current content is `board`
    pub fn new(path: PathBuf, board: Board) -> Self {
        Self {
            path,
            stored: Mutex::new(board),
        }
    }

    /// Opens an existing board file
    pub fn open(path: &Path) -> Result<Self, CliError> {
        let board = load_board(path)?;
        Ok(Self::new(path.to_path_buf(), board))
    }

    /// A copy of the board as last written
    pub async fn snapshot(&self) -> Board {
        self.stored.lock().await.clone()
    }
}

/// Applies a payload to the stored board, checking it still fits
fn apply_payload(stored: &Board, payload: &ChangePayload) -> Result<Board, PersistError> {
    let writes: HashMap<ItemId, RankKey> = payload
        .rank_writes()
        .into_iter()
        .map(|write| (write.item_id, write.rank))
        .collect();

    let mut arrangement = stored.arrangement().clone();
    for order in &payload.partitions {
        if !arrangement.contains_partition(&order.partition) {
            return Err(PersistError::validation(format!(
                "unknown partition {}",
                order.partition
            )));
        }
        let mut previous: Option<&RankKey> = None;
        for id in &order.items {
            let Some(rank) = writes.get(id).or_else(|| stored.rank(id)) else {
                return Err(PersistError::conflict(format!(
                    "item {id} is not on the stored board"
                )));
            };
            if previous.is_some_and(|prev| prev >= rank) {
                return Err(PersistError::conflict(format!(
                    "stored neighbours no longer bracket rank {} in {}",
                    payload.rank, order.partition
                )));
            }
            previous = Some(rank);
        }
        arrangement.set(order.partition.clone(), order.items.clone());
    }

    let next = stored.with_changes(arrangement, writes);
    if !next.verify().is_empty() {
        return Err(PersistError::conflict("payload leaves the stored board inconsistent"));
    }
    Ok(next)
}

#[async_trait]
impl PersistenceBoundary for JsonBoardStore {
    async fn persist_move(&self, payload: &ChangePayload) -> Result<Confirmation, PersistError> {
        let mut stored = self.stored.lock().await;
        let next = apply_payload(&stored, payload)?;

        let text = serde_json::to_string_pretty(&next)
            .map_err(|e| PersistError::validation(format!("cannot serialize board: {e}")))?;
        if let Err(e) = tokio::fs::write(&self.path, text).await {
            warn!(path = %self.path.display(), error = %e, "Failed to write board file");
            return Err(PersistError::transient(format!(
                "cannot write {}: {e}",
                self.path.display()
            )));
        }

        debug!(item = %payload.item_id, rank = %payload.rank, "Board file updated");
        *stored = next;
        Ok(Confirmation::accepted(payload))
    }

    fn boundary_id(&self) -> &'static str {
        "json-file"
    }
}
