//! Styled terminal output utilities.

use owo_colors::OwoColorize;
use ratchet_migrate::MigrationState;

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a plain line
pub fn list(text: &str) {
    println!("{}", text);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print the check report legend
pub fn legend() {
    println!(
        "{} {} {}",
        style_state(MigrationState::Committed, "[C]ommitted"),
        style_state(MigrationState::Pending, "[P]ending"),
        style_state(MigrationState::Missing, "[M]issing"),
    );
}

/// Style text in the colour used for a migration state
pub fn style_state(state: MigrationState, text: &str) -> String {
    match state {
        MigrationState::Committed => text.white().to_string(),
        MigrationState::Pending => text.green().to_string(),
        MigrationState::Missing => text.red().to_string(),
    }
}

/// Style text as a warning (yellow)
pub fn style_warning(text: &str) -> String {
    text.yellow().to_string()
}
