//! `ratchet help` - list available commands.

use crate::cli::Command;
use crate::error::CliResult;
use crate::output;

/// The line printed by `ratchet help`.
pub fn listing() -> String {
    format!("Migration commands: {}", Command::NAMES.join(", "))
}

/// Run the help command
pub async fn run() -> CliResult<()> {
    output::list(&listing());
    Ok(())
}
