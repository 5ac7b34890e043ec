//! Ratchet CLI - command-line migration runner for PostgreSQL.

use std::process::ExitCode;

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};

use ratchet_cli::cli::{Cli, Command, GlobalArgs};
use ratchet_cli::commands;
use ratchet_cli::config::{Config, Settings};
use ratchet_cli::error::CliResult;
use ratchet_cli::{logging, output};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err),
    };

    logging::init(cli.global.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::newline();
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command.unwrap_or(Command::Help) {
        Command::Help => commands::help::run().await,
        Command::Redate(args) => commands::redate::run(args).await,
        Command::Up => commands::up::run(&settings(&cli.global)?).await,
        Command::New(args) => commands::new::run(args, &settings(&cli.global)?).await,
        Command::Check(args) => commands::check::run(args, &settings(&cli.global)?).await,
    }
}

fn settings(global: &GlobalArgs) -> CliResult<Settings> {
    let config = Config::discover(global.config.as_deref())?;
    Ok(Settings::resolve(global, config))
}

fn parse_failure(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        ErrorKind::InvalidSubcommand => {
            let name = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(name)) => name.as_str(),
                _ => "",
            };
            output::error(&format!("Command not found: {}", name));
            output::list(&commands::help::listing());
            ExitCode::FAILURE
        }
        _ => {
            let _ = err.print();
            ExitCode::FAILURE
        }
    }
}
