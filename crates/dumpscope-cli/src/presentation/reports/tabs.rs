use dumpscope_types::{TABS, TabInfo};
use serde::Serialize;
use std::fmt::{self, Write};

use crate::presentation::renderer::{ConsoleView, Style};

#[derive(Debug, Clone, Serialize)]
pub struct TabList {
    pub tabs: Vec<TabInfo>,
}

impl TabList {
    pub fn all() -> Self {
        Self {
            tabs: TABS.to_vec(),
        }
    }
}

impl ConsoleView for TabList {
    fn write_console(&self, out: &mut String, style: Style) -> fmt::Result {
        writeln!(out, "{}", style.heading(&format!("{:<16} LABEL", "ID")))?;
        for tab in &self.tabs {
            writeln!(out, "{:<16} {}", tab.id, tab.label)?;
        }
        Ok(())
    }
}
