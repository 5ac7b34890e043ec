//! `ratchet new` - create a stub migration file.

use ratchet_migrate::MigrationFileManager;

use crate::cli::NewArgs;
use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output;

/// Run the new command
pub async fn run(args: NewArgs, settings: &Settings) -> CliResult<()> {
    let name = args
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or(CliError::MissingArgument("Migration name required"))?;

    let files = MigrationFileManager::new(&settings.migrations_dir);
    let path = files.create(&name).await?;

    output::success(&format!("Created: {}", path.display()));
    Ok(())
}
