//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ratchet - forward-only SQL migrations for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "ratchet")]
#[command(version)]
#[command(about = "Ratchet - forward-only SQL migrations for PostgreSQL", long_about = None)]
#[command(propagate_version = true)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `help`)
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted by every command.
///
/// Each one falls back to `ratchet.toml` and then to a built-in default when
/// neither the flag nor its environment variable is set.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Directory holding migration files [default: migrations]
    #[arg(long, global = true, env = "RATCHET_MIGRATIONS_DIR")]
    pub dir: Option<PathBuf>,

    /// Ledger table as [schema.]table [default: public.migrations]
    #[arg(long, global = true, env = "RATCHET_TABLE")]
    pub table: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Path to the config file [default: ratchet.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Do not take the advisory lock while applying
    #[arg(long, global = true)]
    pub no_lock: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations in order
    #[command(visible_alias = "migrate", alias = "migrate:up")]
    Up,

    /// Create a new migration file
    New(NewArgs),

    /// Move a migration file to a fresh timestamp identity
    Redate(RedateArgs),

    /// Report committed, pending and missing migrations
    Check(CheckArgs),

    /// List available commands
    Help,
}

impl Command {
    /// Names accepted on the command line, in listing order.
    pub const NAMES: [&'static str; 5] = ["up", "new", "redate", "check", "help"];
}

/// Arguments for the `new` command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Name of the migration (e.g. "add users table")
    pub name: Option<String>,
}

/// Arguments for the `redate` command
#[derive(Args, Debug)]
pub struct RedateArgs {
    /// Path of the migration file to redate
    pub path: Option<PathBuf>,
}

/// Arguments for the `check` command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Exit with status 1 if anything is pending or missing
    #[arg(short, long)]
    pub fail: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_command_names_match_subcommands() {
        let cli = Cli::command();
        let mut names: Vec<&str> = cli.get_subcommands().map(|c| c.get_name()).collect();
        let mut expected = Command::NAMES.to_vec();
        names.sort_unstable();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_migrate_aliases() {
        for alias in ["up", "migrate", "migrate:up"] {
            let cli = Cli::try_parse_from(["ratchet", alias]).unwrap();
            assert!(matches!(cli.command, Some(Command::Up)));
        }
    }

    #[test]
    fn test_check_fail_flag() {
        let cli = Cli::try_parse_from(["ratchet", "check", "-f"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check(CheckArgs { fail: true }))));

        let cli = Cli::try_parse_from(["ratchet", "check", "--fail"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check(CheckArgs { fail: true }))));
    }

    #[test]
    fn test_optional_positionals() {
        let cli = Cli::try_parse_from(["ratchet", "new"]).unwrap();
        assert!(matches!(cli.command, Some(Command::New(NewArgs { name: None }))));

        let cli = Cli::try_parse_from(["ratchet", "redate"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Redate(RedateArgs { path: None }))));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ratchet",
            "check",
            "--dir",
            "db/migrations",
            "--table",
            "ops.ledger",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.dir, Some(PathBuf::from("db/migrations")));
        assert_eq!(cli.global.table.as_deref(), Some("ops.ledger"));
        assert_eq!(cli.global.verbose, 2);
    }
}
