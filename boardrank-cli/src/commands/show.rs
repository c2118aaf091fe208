//! Show the board.

use boardrank_core::{Board, PartitionId};
use serde::Serialize;

use super::Context;
use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::store::load_board;
use crate::util::find_partition;

#[derive(Serialize)]
struct ColumnView<'a> {
    partition: &'a str,
    items: Vec<ItemView<'a>>,
}

#[derive(Serialize)]
struct ItemView<'a> {
    id: &'a str,
    rank: Option<&'a str>,
}

/// Show command handler
pub fn cmd_show(
    ctx: Context<'_>,
    format: OutputFormat,
    partition: Option<&str>,
) -> Result<(), CliError> {
    let board = load_board(ctx.board)?;
    let only = partition.map(|p| find_partition(&board, p)).transpose()?;
    let columns = columns(&board, only.as_ref());

    match format {
        OutputFormat::Table => print_table(&columns),
        OutputFormat::Json => print_json(&columns)?,
    }
    Ok(())
}

fn columns<'a>(board: &'a Board, only: Option<&PartitionId>) -> Vec<ColumnView<'a>> {
    board
        .arrangement()
        .iter()
        .filter(|(partition, _)| only.is_none_or(|p| p == *partition))
        .map(|(partition, ids)| ColumnView {
            partition: partition.as_str(),
            items: ids
                .iter()
                .map(|id| ItemView {
                    id: id.as_str(),
                    rank: board.rank(id).map(|r| r.as_str()),
                })
                .collect(),
        })
        .collect()
}

fn print_table(columns: &[ColumnView<'_>]) {
    let id_width = columns
        .iter()
        .flat_map(|c| c.items.iter().map(|i| i.id.len()))
        .max()
        .unwrap_or(0)
        .max(2);

    for column in columns {
        println!("{} ({})", column.partition, column.items.len());
        if column.items.is_empty() {
            println!("  (empty)");
        }
        for (index, item) in column.items.iter().enumerate() {
            println!(
                "  {index:>3}  {:<id_width$}  {}",
                item.id,
                item.rank.unwrap_or("-")
            );
        }
    }
}

fn print_json(columns: &[ColumnView<'_>]) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(columns)
        .map_err(|e| CliError::Board(format!("Failed to serialize board: {e}")))?;
    println!("{json}");
    Ok(())
}
