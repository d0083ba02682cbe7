//! One-shot enumeration of a watched directory.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// List the immediate entries of `dir`, sorted by file name.
///
/// Runs on the calling thread; use [`scan_directory`] from async code.
///
/// # Errors
///
/// Returns [`FsOpsError::Walkdir`] if the directory or any entry cannot be read.
pub fn list_entries(dir: &Path) -> FsOpsResult<Vec<PathBuf>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            entry
                .map(walkdir::DirEntry::into_path)
                .map_err(|source| FsOpsError::walkdir("scan", dir, source))
        })
        .collect()
}

/// Feed every immediate entry of `dir` through `handle`, one at a time.
///
/// The listing runs on the blocking pool. Each entry is awaited before the
/// next one starts. Returns the number of entries handled.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed. No entry is handled in
/// that case.
pub async fn scan_directory<F, Fut>(dir: &Path, mut handle: F) -> FsOpsResult<usize>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = ()>,
{
    let owned = dir.to_path_buf();
    let entries = tokio::task::spawn_blocking(move || list_entries(&owned))
        .await
        .map_err(|source| FsOpsError::join("scan", dir, source))??;

    debug!(dir = %dir.display(), entries = entries.len(), "scanning directory");
    let count = entries.len();
    for entry in entries {
        handle(entry).await;
    }
    Ok(count)
}
