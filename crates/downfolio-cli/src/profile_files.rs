//! Helpers shared by `template` and `job` for working with the markdown files
//! that live in the profile's `Templates/` and `Jobs/` directories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use downfolio_store::paths::markdown_files;

/// Resolve `file` to an existing file inside `dir`.
///
/// A relative path is tried against the working directory first and then
/// against `dir`, so `--file base.md` finds `Templates/base.md`.
pub fn require_inside(file: &Path, dir: &Path) -> Result<PathBuf> {
    let candidate = if file.is_relative() && !file.exists() {
        dir.join(file)
    } else {
        file.to_path_buf()
    };

    if !candidate.is_file() {
        bail!("file not found: {}", file.display());
    }

    let resolved = std::fs::canonicalize(&candidate)
        .with_context(|| format!("failed to resolve {}", candidate.display()))?;
    let root = std::fs::canonicalize(dir)
        .with_context(|| format!("failed to resolve {}", dir.display()))?;
    if !resolved.starts_with(&root) {
        bail!("file must be inside {}", dir.display());
    }
    Ok(resolved)
}

/// Registration name for a file when none is given: the file stem.
pub fn default_name(file: &Path) -> Result<String> {
    file.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .with_context(|| format!("cannot derive a name from {}", file.display()))
}

/// Markdown files in `dir` that none of `registered` points at.
pub fn unregistered<'a>(
    dir: &Path,
    registered: impl IntoIterator<Item = &'a Path>,
) -> Result<Vec<PathBuf>> {
    let known: Vec<PathBuf> = registered.into_iter().map(comparable).collect();
    let files = markdown_files(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    Ok(files
        .into_iter()
        .filter(|f| !known.contains(&comparable(f)))
        .collect())
}

fn comparable(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
