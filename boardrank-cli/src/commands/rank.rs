//! Rank key utilities.

use boardrank_core::RankKey;

use crate::cli::RankCommands;
use crate::error::CliError;

/// Rank command handler
pub fn cmd_rank(subcmd: RankCommands) -> Result<(), CliError> {
    match subcmd {
        RankCommands::Between { lower, upper } => {
            let key = between(lower.as_deref(), upper.as_deref())?;
            println!("{key}");
        }
        RankCommands::Spread { count } => {
            for key in RankKey::spread(count) {
                println!("{key}");
            }
        }
    }
    Ok(())
}

fn between(lower: Option<&str>, upper: Option<&str>) -> Result<RankKey, CliError> {
    let lower = lower.map(RankKey::parse).transpose()?;
    let upper = upper.map(RankKey::parse).transpose()?;
    Ok(RankKey::between(lower.as_ref(), upper.as_ref())?)
}
