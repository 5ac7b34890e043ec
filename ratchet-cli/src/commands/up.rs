//! `ratchet up` - apply pending migrations.

use crate::commands::open_engine;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output;

/// Run the up command
pub async fn run(settings: &Settings) -> CliResult<()> {
    let mut engine = open_engine(settings).await?;

    let result = engine.migrate().await;
    engine.close().await;
    let report = result?;

    if !report.has_changes() {
        output::info(&report.summary());
        return Ok(());
    }

    for id in &report.applied {
        output::list_item(&format!("Applied {}", id));
    }
    output::newline();
    output::success(&report.summary());

    Ok(())
}
