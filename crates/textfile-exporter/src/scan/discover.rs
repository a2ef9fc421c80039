//! File discovery and the per-cycle debug switch.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;

use textfile_core::error::Result;

/// Marker file that turns on verbose tracing while it is recent.
pub const DEBUG_MARKER: &str = "debug_tfe";

/// How long a touched marker keeps verbose tracing on.
pub const DEBUG_WINDOW: Duration = Duration::from_secs(2 * 3600);

/// Regular files under `dir` whose name ends with `suffix`, sorted.
///
/// Without `recursive`, subdirectories are skipped entirely. Symlinks are
/// not followed. Listing errors abort the whole walk.
pub async fn list_files(dir: &Path, suffix: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "cannot stat entry, skipping");
                    continue;
                }
            };

            if file_type.is_dir() {
                if recursive {
                    pending.push(entry.path());
                }
                continue;
            }

            if file_type.is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// True when `dir/debug_tfe` exists and was modified within [`DEBUG_WINDOW`].
pub async fn debug_marker_active(dir: &Path, now: SystemTime) -> bool {
    let Ok(meta) = fs::metadata(dir.join(DEBUG_MARKER)).await else {
        return false;
    };
    let Ok(modified) = meta.modified() else {
        return false;
    };
    match now.duration_since(modified) {
        Ok(age) => age <= DEBUG_WINDOW,
        // Modified "in the future": treat as freshly touched.
        Err(_) => true,
    }
}

/// `mtime + min_age < now`.
pub fn is_stale(modified: SystemTime, min_age: Duration, now: SystemTime) -> bool {
    match modified.checked_add(min_age) {
        Some(deadline) => now > deadline,
        None => false,
    }
}
