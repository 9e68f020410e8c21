//! Core tree synchronization.
//!
//! Mirrors the canonical core source tree into each target's destination
//! directory. A sync is a full replace, not a merge: the destination is
//! recursively deleted first, so files dropped from the core set never
//! survive a run. There is no diffing and no incremental copy; the trees
//! are small and correctness favors simplicity over speed.
//!
//! Known gap: there is no atomicity or rollback. Killing the process
//! mid-sync can leave a destination partially deleted or partially copied;
//! the next run fully regenerates it.

pub mod fsutil;

use crate::config::BuildConfig;
use crate::error::Result;
use crate::pipeline::TargetReport;
use std::path::{Path, PathBuf};

/// Mirrors one canonical source directory into a set of destinations.
#[derive(Debug)]
pub struct Synchronizer {
    source: PathBuf,
    destinations: Vec<(String, PathBuf)>,
}

impl Synchronizer {
    /// Builds a synchronizer for the configured core tree and every target
    /// that declares a sync destination.
    pub fn from_config(config: &BuildConfig) -> Self {
        let destinations = config
            .sync_destinations()
            .filter_map(|t| {
                t.dest_dir
                    .as_ref()
                    .map(|dest| (t.name.clone(), dest.clone()))
            })
            .collect();
        Self {
            source: config.core_dir.clone(),
            destinations,
        }
    }

    /// Builds a synchronizer from explicit paths.
    pub fn new(source: PathBuf, destinations: Vec<(String, PathBuf)>) -> Self {
        Self {
            source,
            destinations,
        }
    }

    /// Syncs every destination, collecting one report per target.
    ///
    /// A failed destination is reported and does not stop the others; the
    /// caller must not treat a failed destination as usable.
    pub async fn sync_all(&self) -> Result<Vec<TargetReport>> {
        if !self.source.is_dir() {
            crate::bail!("core source tree not found: {}", self.source.display());
        }

        let mut reports = Vec::with_capacity(self.destinations.len());
        for (name, dest) in &self.destinations {
            log::info!("Syncing core to {}", dest.display());
            match self.sync_one(dest).await {
                Ok(()) => reports.push(TargetReport::success(name.clone())),
                Err(e) => {
                    log::error!("Sync of {name} failed: {e}");
                    reports.push(TargetReport::failed(name.clone(), e.to_string()));
                }
            }
        }
        Ok(reports)
    }

    /// Fully replaces one destination with the source tree.
    pub async fn sync_one(&self, dest: &Path) -> Result<()> {
        fsutil::remove_dir_all(dest).await?;
        fsutil::copy_tree(&self.source, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_files(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(root).unwrap().to_path_buf(),
                    std::fs::read(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn destination_equals_source_after_sync() {
        let dir = tempfile::tempdir().unwrap();
        let core = dir.path().join("core");
        std::fs::create_dir_all(core.join("js")).unwrap();
        std::fs::write(core.join("js/app.js"), "console.log('app');").unwrap();
        std::fs::write(core.join("style.css"), "body {}").unwrap();

        let dest = dir.path().join("chrome/src/core");
        // Pre-seed the destination with stale state: a file that no longer
        // exists in the core set, and an outdated copy of a live one.
        std::fs::create_dir_all(dest.join("js")).unwrap();
        std::fs::write(dest.join("js/removed.js"), "stale").unwrap();
        std::fs::write(dest.join("style.css"), "old").unwrap();

        let sync = Synchronizer::new(core.clone(), vec![("chrome".into(), dest.clone())]);
        let reports = sync.sync_all().await.unwrap();
        assert!(
            reports
                .iter()
                .all(|r| r.outcome == crate::pipeline::Outcome::Success)
        );

        assert_eq!(collect_files(&core), collect_files(&dest));
        assert!(!dest.join("js/removed.js").exists());
    }

    #[tokio::test]
    async fn failed_destination_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let core = dir.path().join("core");
        std::fs::create_dir_all(&core).unwrap();
        std::fs::write(core.join("a.txt"), "a").unwrap();

        // A destination whose parent is an existing *file* cannot be created.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();

        let good = dir.path().join("good/core");
        let sync = Synchronizer::new(
            core,
            vec![
                ("bad".into(), blocker.join("core")),
                ("good".into(), good.clone()),
            ],
        );
        let reports = sync.sync_all().await.unwrap();
        assert_eq!(reports[0].outcome, crate::pipeline::Outcome::Failed);
        assert_eq!(reports[1].outcome, crate::pipeline::Outcome::Success);
        assert!(good.join("a.txt").exists());
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sync = Synchronizer::new(
            dir.path().join("nope"),
            vec![("x".into(), dir.path().join("out"))],
        );
        assert!(sync.sync_all().await.is_err());
    }
}
