//! File system helpers for tree mirroring.
//!
//! Copy operations create parent directories as needed and preserve
//! symlinks; removal is idempotent.

use crate::error::{BuildError, ErrorExt, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e.into()),
    }
}

/// Copies a regular file, creating any parent directories of the
/// destination path as necessary.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(BuildError::Generic(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", to)?;
    Ok(())
}

/// Recursively copies a directory tree, creating any parent directories of
/// the destination path as necessary.
///
/// Preserves symlinks on platforms that support them. Fails if the source
/// path is not a directory.
pub async fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(BuildError::Generic(format!(
            "{from:?} is not a directory"
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Blocking iteration belongs on the blocking pool
    tokio::task::spawn_blocking(move || {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry?;
            debug_assert!(entry.path().starts_with(&from));
            let rel_path = entry
                .path()
                .strip_prefix(&from)
                .map_err(|e| BuildError::Generic(e.to_string()))?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let link_target = std::fs::read_link(entry.path())?;
                if entry.path().is_dir() {
                    symlink_dir(&link_target, &dest_path)?;
                } else {
                    symlink_file(&link_target, &dest_path)?;
                }
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(dest_path)?;
            } else {
                std::fs::copy(entry.path(), dest_path)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| BuildError::Generic(format!("tree copy task panicked: {e}")))?
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_dir_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created");
        remove_dir_all(&missing).await.unwrap();
        remove_dir_all(&missing).await.unwrap();
    }

    #[tokio::test]
    async fn copy_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, "payload").unwrap();

        let dest = dir.path().join("deep/nested/a.txt");
        copy_file(&src, &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "payload");
    }

    #[tokio::test]
    async fn copy_tree_mirrors_structure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("js/utils")).unwrap();
        std::fs::write(src.join("js/app.js"), "app").unwrap();
        std::fs::write(src.join("js/utils/log.js"), "log").unwrap();

        let dest = dir.path().join("dest");
        copy_tree(&src, &dest).await.unwrap();

        assert_eq!(std::fs::read_to_string(dest.join("js/app.js")).unwrap(), "app");
        assert_eq!(
            std::fs::read_to_string(dest.join("js/utils/log.js")).unwrap(),
            "log"
        );
    }
}
