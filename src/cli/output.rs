//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::models::Role;
use crate::store::UserSummary;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a table of users
pub fn print_user_table(users: &[UserSummary]) {
    if users.is_empty() {
        info("No users yet. Register in the portal or run 'idcdetect add-user --username <name>'");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Username").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Predictions").fg(Color::Cyan),
        ]);

    for user in users {
        let role_color = match user.role {
            Role::Pathologist => Color::Magenta,
            Role::Patient => Color::Green,
        };

        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(&user.username),
            Cell::new(user.role).fg(role_color),
            Cell::new(user.predictions),
        ]);
    }

    println!("{table}");
}

/// One `doctor` check line
pub fn check(label: &str, ok: bool, detail: &str) {
    let icon = if ok { "●".green() } else { "○".red() };
    println!("  {} {} {}", icon, format!("{}:", label).bold(), detail);
}
