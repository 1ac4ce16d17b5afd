use anyhow::{Result, bail};
use dumpscope_runtime::ACCEPTED_EXTENSIONS;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand command-line paths into upload files.
///
/// Files named explicitly are always taken. Directories are walked
/// recursively and only files with an accepted extension are picked up, in
/// file-name order.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let before = files.len();
            for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && has_accepted_extension(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            if files.len() == before {
                tracing::warn!(dir = %path.display(), "no uploadable files found");
            }
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    Ok(files)
}

fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}
