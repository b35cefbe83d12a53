use colored::Colorize;
use std::fmt;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
        MessageKind::Success => format!("[ok] {}", text).bright_green().to_string(),
        MessageKind::Warning => format!("[!] {}", text).bright_yellow().to_string(),
        MessageKind::Error => format!("[x] {}", text).bright_red().to_string(),
        MessageKind::Info => text,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        MessageKind::Error => eprintln!("{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Colors a balance by sign; zero stays plain.
pub fn balance_text(value: credit_domain::Credits) -> String {
    let rendered = value.render();
    if value.value() < 0.0 {
        rendered.red().to_string()
    } else if value.value() > 0.0 {
        rendered.green().to_string()
    } else {
        rendered
    }
}

/// Enables or disables ANSI colors for the rest of the process.
pub fn set_color_enabled(enabled: bool) {
    colored::control::set_override(enabled);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_messages_are_unstyled() {
        assert_eq!(apply_style(MessageKind::Info, "plain"), "plain");
    }

    #[test]
    fn styled_messages_keep_their_text() {
        set_color_enabled(false);
        assert_eq!(apply_style(MessageKind::Success, "done"), "[ok] done");
        assert_eq!(apply_style(MessageKind::Section, " Players "), "=== Players ===");
        assert_eq!(balance_text(credit_domain::Credits::new(-50.0)), "-50cr");
    }
}
