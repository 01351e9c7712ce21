//! Filesystem helpers shared by the batch stages.
//!
//! Directory listings drive the skip-if-exists checks, and finished outputs
//! are moved into place from a scratch directory so a partially written file
//! never appears under its final name.

use std::collections::BTreeSet;
use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Names of all entries in `dir`. A missing directory lists as empty.
pub async fn list_file_names(dir: impl AsRef<Path>) -> MediaResult<BTreeSet<String>> {
    let dir = dir.as_ref();
    let mut names = BTreeSet::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(MediaError::from(e)),
    };

    while let Some(entry) = entries.next_entry().await? {
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }

    Ok(names)
}

/// Names of entries in `dir` ending in `.{extension}`, sorted.
pub async fn list_files_with_extension(
    dir: impl AsRef<Path>,
    extension: &str,
) -> MediaResult<BTreeSet<String>> {
    let suffix = format!(".{}", extension);
    Ok(list_file_names(dir)
        .await?
        .into_iter()
        .filter(|name| name.ends_with(&suffix))
        .collect())
}

/// Move a finished file to its final location.
///
/// Tries a rename first; when source and destination sit on different
/// filesystems (EXDEV) the file is copied next to the destination under a
/// temporary name and then renamed, so `dst` only ever appears complete.
pub async fn move_into_place(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename, copying instead: {} -> {}",
                src.display(),
                dst.display()
            );
            let staging = dst.with_extension("partial");
            fs::copy(src, &staging).await?;
            if let Err(e) = fs::rename(&staging, dst).await {
                let _ = fs::remove_file(&staging).await;
                return Err(MediaError::from(e));
            }
            if let Err(e) = fs::remove_file(src).await {
                tracing::warn!("Failed to remove scratch file {}: {}", src.display(), e);
            }
            Ok(())
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV is error code 18 on Linux/macOS
    e.raw_os_error() == Some(18)
}
