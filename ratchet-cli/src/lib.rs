//! Ratchet CLI - command-line migration runner for PostgreSQL.
//!
//! This crate provides the `ratchet` binary's argument parsing, configuration
//! layering, command implementations and terminal rendering. Commands return
//! [`error::CliResult`]; only `main` turns results into exit codes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
