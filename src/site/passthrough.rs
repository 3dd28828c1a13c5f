use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Copy a file or directory into the output without transforming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughRule {
    /// Relative to the project root
    pub source: PathBuf,
    /// Relative to the output directory
    pub destination: PathBuf,
}

/// What a passthrough copy did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The files written into the output directory
    Copied(Vec<PathBuf>),
    /// The source doesn't exist
    Missing,
}

impl PassthroughRule {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Copy the source into `output_dir`, overwriting whatever is there.
    ///
    /// Directories are copied recursively, keeping their layout under the
    /// destination. Running the copy again produces the same files.
    pub fn copy(&self, base_path: &Path, output_dir: &Path) -> std::io::Result<CopyOutcome> {
        let source = base_path.join(&self.source);
        // A leading slash would make `join` discard the output directory
        let destination = output_dir.join(
            self.destination
                .strip_prefix("/")
                .unwrap_or(&self.destination),
        );

        if source.is_file() {
            copy_file(&source, &destination)?;
            return Ok(CopyOutcome::Copied(vec![destination]));
        }

        if !source.is_dir() {
            return Ok(CopyOutcome::Missing);
        }

        let mut copied = Vec::new();
        for entry in WalkDir::new(&source).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&source)
                .map_err(std::io::Error::other)?;
            let target = destination.join(relative);
            copy_file(entry.path(), &target)?;
            copied.push(target);
        }

        Ok(CopyOutcome::Copied(copied))
    }
}

fn copy_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(from, to)?;
    Ok(())
}
