//! Target packaging.
//!
//! Zips a target's full directory tree into `{build-dir}/{target}-{version}.zip`,
//! with the version read from the target's manifest. Any pre-existing
//! archive at the computed path is deleted first, so a stale duplicate
//! never coexists with a fresh one. Entries are stored relative to the
//! target root; VCS and OS metadata are excluded via the target's glob
//! patterns. One target failing never prevents packaging the others.

use crate::config::TargetConfig;
use crate::error::{BuildError, ErrorExt, Result};
use glob::Pattern;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Creates distributable archives for packaged targets.
#[derive(Debug)]
pub struct Packager {
    build_dir: PathBuf,
}

impl Packager {
    /// Builds a packager writing archives into `build_dir`.
    pub fn new(build_dir: PathBuf) -> Self {
        Self { build_dir }
    }

    /// Packages one target, returning the path of the written archive.
    ///
    /// A missing manifest is fatal for this target only.
    pub async fn package(&self, target: &TargetConfig) -> Result<PathBuf> {
        let manifest_path = target.manifest.path();
        if !manifest_path.exists() {
            return Err(BuildError::MissingManifest {
                target: target.name.clone(),
                path: manifest_path.to_path_buf(),
            });
        }
        let version = manifest_version(manifest_path)?;

        tokio::fs::create_dir_all(&self.build_dir)
            .await
            .fs_context("creating build directory", &self.build_dir)?;

        let archive_path = self
            .build_dir
            .join(format!("{}-{}.zip", target.name, version));

        // Create-or-replace: never leave a stale archive under the new name
        if archive_path.exists() {
            tokio::fs::remove_file(&archive_path)
                .await
                .fs_context("removing stale archive", &archive_path)?;
        }

        let root = target.root_dir.clone();
        let excludes = compile_patterns(&target.exclude)?;
        let out = archive_path.clone();

        tokio::task::spawn_blocking(move || write_archive(&root, &out, &excludes))
            .await
            .map_err(|e| BuildError::Generic(format!("packaging task panicked: {e}")))??;

        log::info!("Created archive: {}", archive_path.display());
        Ok(archive_path)
    }
}

/// Reads the `version` string from a JSON manifest.
fn manifest_version(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    value
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| BuildError::MissingField {
            path: path.to_path_buf(),
            field: "version".to_string(),
        })
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns.iter().map(|p| Ok(Pattern::new(p)?)).collect()
}

/// Whether any path component matches one of the exclusion patterns.
fn is_excluded(rel: &Path, excludes: &[Pattern]) -> bool {
    rel.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        excludes.iter().any(|p| p.matches(&name))
    })
}

fn write_archive(root: &Path, out: &Path, excludes: &[Pattern]) -> Result<()> {
    let file = std::fs::File::create(out)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut buffer = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| BuildError::Generic(e.to_string()))?;
        if rel.as_os_str().is_empty() || is_excluded(rel, excludes) {
            continue;
        }

        // Zip entry names always use forward slashes
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else {
            zip.start_file(name, options)?;
            let mut src = std::fs::File::open(entry.path())?;
            buffer.clear();
            src.read_to_end(&mut buffer)?;
            zip.write_all(&buffer)?;
        }
    }

    zip.finish()?;
    Ok(())
}
