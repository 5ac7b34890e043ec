//! `ratchet redate` - move a migration to a fresh identity.

use crate::cli::RedateArgs;
use crate::error::{CliError, CliResult};
use crate::output;

/// Run the redate command
pub async fn run(args: RedateArgs) -> CliResult<()> {
    let path = args
        .path
        .ok_or(CliError::MissingArgument("Migration path required"))?;

    let new_path = ratchet_migrate::redate(&path).await?;

    output::success(&format!("Moved to: {}", new_path.display()));
    Ok(())
}
