//! Destination planning and file relocation.
//!
//! The photos tree mirrors the inbox's subdirectory structure: a file at
//! `uploads/2023/Summer/img.jpg` lands at `Photos/2023/Summer/img.jpg` (under
//! its clean name). Collisions are last-write-wins, no versioning.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a file will live once ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDestination {
    /// Subdirectory portion of the source path, relative to the inbox root.
    pub relative_dir: PathBuf,
    /// Absolute destination path under the photos root.
    pub destination: PathBuf,
}

/// Compute the destination for a file and make sure its directory exists.
///
/// `relative_source` is the source path relative to the inbox root; only its
/// parent portion is mirrored, the filename is replaced by `clean_name`.
pub fn plan(
    photos_root: &Path,
    relative_source: &Path,
    clean_name: &str,
) -> Result<PlannedDestination> {
    let relative_dir = relative_source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let target_dir = photos_root.join(&relative_dir);
    fs::create_dir_all(&target_dir)
        .with_context(|| format!("creating destination directory {}", target_dir.display()))?;

    Ok(PlannedDestination {
        destination: target_dir.join(clean_name),
        relative_dir,
    })
}

/// Move a file into its planned destination, replacing any existing file.
pub fn move_into_place(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        fs::remove_file(destination)
            .with_context(|| format!("removing stale file {}", destination.display()))?;
    }

    transfer(source, destination).with_context(|| {
        format!(
            "moving {} to {}",
            source.display(),
            destination.display()
        )
    })?;

    Ok(())
}

/// Move a file by rename; if source and destination sit on different
/// filesystems fall back to copy + delete. Used both for the forward move
/// and for returning a file to the inbox after a failed commit.
pub fn transfer(source: &Path, destination: &Path) -> std::io::Result<()> {
    fs::rename(source, destination).or_else(|_| {
        fs::copy(source, destination)?;
        fs::remove_file(source)
    })
}
