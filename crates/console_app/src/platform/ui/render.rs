use std::fmt::Write as _;

use chrono::{DateTime, Local};
use console_core::{ConsoleViewModel, Notification, NotificationLevel};

pub fn notification(notification: &Notification, at: DateTime<Local>) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
        NotificationLevel::Info => "info",
    };
    format!(
        "[{}] {:>5}: {}",
        at.format("%H:%M:%S"),
        tag,
        notification.message
    )
}

/// File table for the displayed kind, with a marker on selected rows.
pub fn render_table(view: &ConsoleViewModel) -> String {
    let mut out = String::new();
    let title = capitalize(&view.displayed.to_string());
    let _ = writeln!(out, "{} files ({})", title, view.rows.len());
    if view.rows.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }

    let id_width = view
        .rows
        .iter()
        .map(|row| row.id.to_string().len())
        .max()
        .unwrap_or(1)
        .max(2);
    let _ = writeln!(out, "    {:>id_width$}  Name", "Id");
    for row in &view.rows {
        let marker = if row.selected { '*' } else { ' ' };
        let _ = writeln!(out, "  {} {:>id_width$}  {}", marker, row.id, row.name);
    }
    if view.selected_count > 0 {
        let _ = writeln!(out, "  {} selected", view.selected_count);
    }
    out
}

/// File counts plus any listing errors. Session counters are left out: each
/// invocation starts a fresh session, so they would always read zero.
pub fn render_dashboard(view: &ConsoleViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Source files:     {}", view.source_count);
    let _ = writeln!(out, "Converted files:  {}", view.converted_count);
    for error in &view.errors {
        let _ = writeln!(out, "Last error ({}): {}", error.operation, error.message);
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
