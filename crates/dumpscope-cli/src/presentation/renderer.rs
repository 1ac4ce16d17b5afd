use anyhow::Result;
use dumpscope_engine::{HealthStatus, Severity};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;

use super::result::CommandResultViewModel;

/// Console form of a report
pub trait ConsoleView {
    fn write_console(&self, out: &mut String, style: Style) -> fmt::Result;
}

/// Whether console output may carry ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    /// Colored only when stdout is a terminal
    pub fn detect() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn command(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    /// Status label padded to `width` before coloring, so columns line up
    pub fn status(&self, status: HealthStatus, width: usize) -> String {
        let label = format!("{:<width$}", super::format::status_label(status));
        if !self.color {
            return label;
        }
        match status {
            HealthStatus::Healthy => label.green().to_string(),
            HealthStatus::Warning => label.yellow().to_string(),
            HealthStatus::Critical => label.red().bold().to_string(),
        }
    }

    pub fn severity(&self, severity: Severity, width: usize) -> String {
        let label = format!("{:<width$}", super::format::severity_label(severity));
        if !self.color {
            return label;
        }
        match severity {
            Severity::Low => label.dimmed().to_string(),
            Severity::Medium => label.yellow().to_string(),
            Severity::High => label.red().to_string(),
            Severity::Critical => label.red().bold().to_string(),
        }
    }
}

pub struct ConsoleRenderer {
    json_mode: bool,
    style: Style,
}

impl ConsoleRenderer {
    pub fn new(json_mode: bool) -> Self {
        Self {
            json_mode,
            style: Style::detect(),
        }
    }

    pub fn render<T>(&self, result: CommandResultViewModel<T>) -> Result<()>
    where
        T: Serialize + ConsoleView,
    {
        if self.json_mode {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        print!("{}", render_console(&result, self.style)?);
        Ok(())
    }
}

/// Console text for a result, without printing it
pub fn render_console<T>(result: &CommandResultViewModel<T>, style: Style) -> Result<String>
where
    T: Serialize + ConsoleView,
{
    use std::fmt::Write;

    let mut out = String::new();

    if let Some(badge) = &result.badge {
        writeln!(out, "{} {}", badge.icon(), style.heading(&badge.label))?;
        writeln!(out)?;
    }

    result.content.write_console(&mut out, style)?;

    if !result.suggestions.is_empty() {
        writeln!(out, "\n{}", style.heading("Tips:"))?;
        for tip in &result.suggestions {
            write!(out, "  • {}", tip.description)?;
            if let Some(cmd) = &tip.command {
                write!(out, ": {}", style.command(cmd))?;
            }
            writeln!(out)?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{Guidance, StatusBadge, TabList};

    #[test]
    fn test_plain_console_layout() {
        let result = CommandResultViewModel::new(TabList::all())
            .with_badge(StatusBadge::info("5 tabs"))
            .with_suggestions(vec![
                Guidance::new("Render one").with_command("dumpscope view dumps/"),
            ]);

        let text = render_console(&result, Style::plain()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!("{} 5 tabs", StatusBadge::info("").icon()));
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "ID               LABEL");
        assert_eq!(lines[3], "overview         Overview");
        assert_eq!(lines[7], "mysql-queries    MySQL Queries");
        assert_eq!(lines.last(), Some(&"  • Render one: dumpscope view dumps/"));
    }

    #[test]
    fn test_colored_status_keeps_padding_inside_escape() {
        let plain = Style::plain().status(HealthStatus::Warning, 8);
        let colored = Style::colored().status(HealthStatus::Warning, 8);

        assert_eq!(plain, "warning ");
        assert!(colored.contains("warning "));
        assert!(colored.starts_with('\u{1b}'));
    }
}
