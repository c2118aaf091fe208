//! Shared utility functions used across command modules.

use std::path::Path;

use boardrank_core::config::ConfigManager;
use boardrank_core::{Board, BoardSettings, ItemId, PartitionId, ReconcilerConfig};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings from the optional custom config directory
pub fn load_settings(config_path: Option<&Path>) -> Result<BoardSettings, CliError> {
    let settings = create_config_manager(config_path)?
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
    Ok(settings)
}

/// Reconciler configuration derived from settings
pub fn reconciler_config(config_path: Option<&Path>) -> Result<ReconcilerConfig, CliError> {
    Ok(ReconcilerConfig::from_settings(&load_settings(config_path)?))
}

/// Builds the runtime used to drive async commits
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(CliError::Io)
}

/// Find an item by exact id, then by unique case-insensitive prefix
pub fn find_item(board: &Board, id: &str) -> Result<ItemId, CliError> {
    let exact = ItemId::from(id);
    if board.arrangement().contains_item(&exact) {
        return Ok(exact);
    }

    let needle = id.to_lowercase();
    let matches: Vec<ItemId> = board
        .arrangement()
        .iter()
        .flat_map(|(_, ids)| ids.iter())
        .filter(|candidate| candidate.as_str().to_lowercase().starts_with(&needle))
        .cloned()
        .collect();

    match matches.len() {
        0 => Err(CliError::ItemNotFound(id.to_string())),
        1 => Ok(matches[0].clone()),
        _ => {
            let names: Vec<_> = matches.iter().map(ItemId::as_str).collect();
            Err(CliError::InvalidArgument(format!(
                "Ambiguous item id '{}'. Matches: {}",
                id,
                names.join(", ")
            )))
        }
    }
}

/// Resolves a column name, ignoring case
pub fn find_partition(board: &Board, name: &str) -> Result<PartitionId, CliError> {
    board
        .arrangement()
        .partition_ids()
        .find(|p| p.as_str().eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| CliError::InvalidArgument(format!("Unknown column: {name}")))
}
