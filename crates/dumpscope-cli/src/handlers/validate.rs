use anyhow::{Result, bail};
use dumpscope_runtime::{IngestOutput, Upload, decode_upload};
use dumpscope_types::{SourceKind, validate_batch};
use std::path::{Path, PathBuf};

use crate::files::collect_files;
use crate::presentation::{
    CommandResultViewModel, ConsoleRenderer, FileReport, Guidance, StatusBadge, ValidationReport,
};

pub fn handle(
    renderer: &ConsoleRenderer,
    paths: &[PathBuf],
    kind: Option<SourceKind>,
) -> Result<()> {
    let files = collect_files(paths)?;
    let reports = files
        .iter()
        .map(|path| check_file(path, kind))
        .collect::<Result<Vec<_>>>()?;
    let report = ValidationReport::new(reports);

    let clean = report.is_clean();
    let problems = report.rejected + report.failed_files;
    let badge = if clean {
        StatusBadge::success(format!(
            "{} record(s) in {} file(s) passed",
            report.accepted,
            report.files.len()
        ))
    } else {
        StatusBadge::error(format!("{} problem(s) found", problems))
    };
    let suggestions = if clean {
        Vec::new()
    } else {
        vec![Guidance::new("Rejected records are skipped when the files are viewed")]
    };

    renderer.render(
        CommandResultViewModel::new(report)
            .with_badge(badge)
            .with_suggestions(suggestions),
    )?;

    if !clean {
        bail!("validation failed with {} problem(s)", problems);
    }
    Ok(())
}

/// Decode and gate one file the same way an upload is
fn check_file(path: &Path, kind: Option<SourceKind>) -> Result<FileReport> {
    let mut upload = Upload::from_path(path)?;
    if let Some(kind) = kind {
        upload = upload.with_kind(kind);
    }
    let display_path = path.display().to_string();

    let report = match decode_upload(&upload) {
        Ok(IngestOutput { records, rejected }) => {
            let batch = validate_batch(records);
            let accepted = batch.accepted_count();
            let mut problems = rejected;
            problems.extend(batch.rejected);
            tracing::debug!(file = %display_path, accepted, rejected = problems.len(), "file checked");
            FileReport {
                path: display_path,
                accepted,
                rejected: problems,
                error: None,
            }
        }
        Err(err) => FileReport {
            path: display_path,
            accepted: 0,
            rejected: Vec::new(),
            error: Some(err.reason),
        },
    };
    Ok(report)
}
