use dumpscope_types::InvalidRecord;
use serde::Serialize;
use std::fmt::{self, Write};

use crate::presentation::renderer::{ConsoleView, Style};

/// Outcome of checking one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub accepted: usize,
    pub rejected: Vec<InvalidRecord>,
    /// Set when the file could not be ingested at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.rejected.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
    pub accepted: usize,
    pub rejected: usize,
    pub failed_files: usize,
}

impl ValidationReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        let accepted = files.iter().map(|f| f.accepted).sum();
        let rejected = files.iter().map(|f| f.rejected.len()).sum();
        let failed_files = files.iter().filter(|f| f.error.is_some()).count();
        Self {
            files,
            accepted,
            rejected,
            failed_files,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.files.iter().all(FileReport::is_clean)
    }
}

impl ConsoleView for ValidationReport {
    fn write_console(&self, out: &mut String, style: Style) -> fmt::Result {
        if self.files.is_empty() {
            writeln!(out, "No files to check.")?;
            return Ok(());
        }

        for file in &self.files {
            match &file.error {
                Some(error) => {
                    writeln!(out, "{}  {}", style.heading(&file.path), error)?;
                }
                None => {
                    writeln!(
                        out,
                        "{}  {} accepted, {} rejected",
                        style.heading(&file.path),
                        file.accepted,
                        file.rejected.len()
                    )?;
                    for invalid in &file.rejected {
                        writeln!(out, "  - {}", invalid)?;
                    }
                }
            }
        }

        writeln!(out)?;
        writeln!(
            out,
            "{} accepted, {} rejected, {} file(s) failed",
            self.accepted, self.rejected, self.failed_files
        )
    }
}
