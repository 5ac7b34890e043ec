//! `ratchet check` - report drift between the migrations directory and the ledger.

use ratchet_migrate::{
    MigrationFileManager, MigrationState, ReconciledMigration, Reconciliation,
};

use crate::cli::CheckArgs;
use crate::commands::open_engine;
use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output;

/// One line of the check report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    /// Empty line.
    Blank,
    /// The `[C]ommitted [P]ending [M]issing` key.
    Legend,
    /// Uncoloured text.
    Plain(String),
    /// A reconciled entry, coloured by its state.
    Entry(MigrationState, String),
    /// Highlighted caution.
    Warning(String),
}

/// Run the check command
pub async fn run(args: CheckArgs, settings: &Settings) -> CliResult<()> {
    let mut engine = open_engine(settings).await?;
    let files = engine.files().clone();

    let result = engine.status().await;
    engine.close().await;
    let status = result?;

    for line in render(&status, &files) {
        print_line(&line);
    }

    if args.fail && status.has_drift() {
        return Err(CliError::Drift {
            pending: status.count(MigrationState::Pending),
            missing: status.count(MigrationState::Missing),
        });
    }

    Ok(())
}

fn print_line(line: &ReportLine) {
    match line {
        ReportLine::Blank => output::newline(),
        ReportLine::Legend => output::legend(),
        ReportLine::Plain(text) => output::list(text),
        ReportLine::Entry(state, text) => output::list(&output::style_state(*state, text)),
        ReportLine::Warning(text) => output::list(&output::style_warning(text)),
    }
}

/// Lay out the report for `status`.
///
/// Missing entries have no file, so their redate commands name the path the
/// file would have under `files`.
pub fn render(status: &Reconciliation, files: &MigrationFileManager) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::Blank, ReportLine::Legend, ReportLine::Blank];

    lines.push(ReportLine::Plain(
        if status.has_drift() {
            "Outstanding migrations:"
        } else {
            "Migrations all caught up!"
        }
        .to_string(),
    ));
    lines.push(ReportLine::Blank);

    for entry in status.migrations() {
        lines.push(ReportLine::Entry(
            entry.state,
            format!("{}: {}, {}", entry.state.code(), entry.id, entry.description),
        ));
    }
    lines.push(ReportLine::Blank);

    let late: Vec<&ReconciledMigration> = status.out_of_order().collect();
    if !late.is_empty() {
        lines.push(ReportLine::Warning(
            "Pending migrations older than the newest committed one (applied out of order):"
                .to_string(),
        ));
        for entry in late {
            lines.push(ReportLine::Warning(format!(
                "  {}, {}",
                entry.id, entry.description
            )));
        }
        lines.push(ReportLine::Blank);
    }

    if status.has_missing() {
        push_heading(&mut lines, "COMMANDS FOR FIXING (be careful)", '=');
        lines.push(ReportLine::Blank);
        push_heading(&mut lines, "Redate missing migrations", '-');
        push_redate_commands(&mut lines, status.missing(), files);
        lines.push(ReportLine::Blank);
    }

    if status.has_missing() && status.has_pending() {
        push_heading(&mut lines, "(Optional) Redate pending migrations", '-');
        push_redate_commands(&mut lines, status.pending(), files);
        lines.push(ReportLine::Blank);
    }

    lines
}

fn push_heading(lines: &mut Vec<ReportLine>, title: &str, underline: char) {
    lines.push(ReportLine::Plain(title.to_string()));
    lines.push(ReportLine::Plain(
        underline.to_string().repeat(title.chars().count()),
    ));
}

// `sleep 1` between commands gives each redate its own second-resolution identity.
fn push_redate_commands<'a>(
    lines: &mut Vec<ReportLine>,
    entries: impl Iterator<Item = &'a ReconciledMigration>,
    files: &MigrationFileManager,
) {
    for (i, entry) in entries.enumerate() {
        if i > 0 {
            lines.push(ReportLine::Plain("sleep 1".to_string()));
        }
        let path = entry
            .path
            .clone()
            .unwrap_or_else(|| files.expected_path(entry.id, &entry.description));
        lines.push(ReportLine::Plain(format!(
            "ratchet redate {}",
            path.display()
        )));
    }
}
