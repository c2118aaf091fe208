//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// `BoardRank` command-line interface for ordered kanban boards
#[derive(Parser)]
#[command(name = "boardrank-cli")]
#[command(author, version, about = "BoardRank command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the board file
    #[arg(short, long, global = true, env = "BOARDRANK_BOARD", default_value = "board.json")]
    pub board: PathBuf,

    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "BOARDRANK_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new board file
    #[command(about = "Create an empty board with the given columns")]
    Init {
        /// Column names (defaults to the configured partitions)
        #[arg(short, long = "partition", value_name = "NAME")]
        partitions: Vec<String>,

        /// Overwrite an existing board file
        #[arg(long)]
        force: bool,
    },

    /// Add an item to the end of a column
    #[command(about = "Add a new item at the end of a column")]
    Add {
        /// Item id (a random id is generated if omitted)
        id: Option<String>,

        /// Column to add the item to
        #[arg(short = 't', long = "to", value_name = "PARTITION")]
        partition: String,
    },

    /// Show the board
    #[command(about = "Show every column with its items and ranks")]
    Show {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Only show this column
        #[arg(short, long)]
        partition: Option<String>,
    },

    /// Move an item
    #[command(about = "Move an item within or across columns")]
    Move(MoveArgs),

    /// Rank key utilities
    #[command(subcommand)]
    Rank(RankCommands),

    /// Renumber a column with evenly spaced ranks
    #[command(about = "Rewrite every rank in a column with evenly spaced keys")]
    Rebalance {
        /// Column to rebalance
        partition: String,
    },

    /// Verify that display order and rank order agree
    #[command(about = "Check the board for ordering problems")]
    Check,

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate a man page
    #[command(about = "Generate a man page and write it to stdout")]
    Manpage,
}

/// Arguments of the `move` command
#[derive(Args)]
pub struct MoveArgs {
    /// Item to move
    pub item: String,

    /// Target column (defaults to the item's current column)
    #[arg(short = 't', long = "to", value_name = "PARTITION")]
    pub partition: Option<String>,

    /// Position in the target column, counted without the moved item
    #[arg(short, long, conflicts_with_all = ["before", "after"])]
    pub index: Option<usize>,

    /// Drop directly before this item
    #[arg(long, value_name = "ITEM", conflicts_with = "after")]
    pub before: Option<String>,

    /// Drop directly after this item
    #[arg(long, value_name = "ITEM")]
    pub after: Option<String>,
}

/// Rank subcommands
#[derive(Subcommand)]
pub enum RankCommands {
    /// Generate a key between two keys
    #[command(about = "Print a rank key strictly between two keys")]
    Between {
        /// Lower bound (omit for the start of the keyspace)
        #[arg(long)]
        lower: Option<String>,

        /// Upper bound (omit for the end of the keyspace)
        #[arg(long)]
        upper: Option<String>,
    },

    /// Generate evenly spaced keys
    #[command(about = "Print COUNT evenly spaced, increasing rank keys")]
    Spread {
        /// Number of keys
        count: usize,
    },
}

/// Output format for the show command
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}
