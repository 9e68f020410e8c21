//! Native bridge sync and Android build invocation.
//!
//! Both operations shell out to external tools probed on PATH; they are
//! modeled as blocking calls with no timeout. Their failures are tolerated
//! by the orchestrator — logged, never fatal to the run.

use crate::error::{BuildError, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Check if npx is available for running the bridge CLI.
///
/// Cached result to avoid repeated subprocess probes during a run.
static HAS_NPX: LazyLock<bool> = LazyLock::new(|| match which::which("npx") {
    Ok(path) => {
        log::debug!("Found npx at: {}", path.display());
        true
    }
    Err(e) => {
        log::debug!("npx not found in PATH: {e}. Native bridge sync will be skipped.");
        false
    }
});

/// Gradle binary on PATH, used when the project ships no wrapper.
static GRADLE_ON_PATH: LazyLock<Option<PathBuf>> =
    LazyLock::new(|| match which::which("gradle") {
        Ok(path) => {
            log::debug!("Found gradle at: {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("gradle not found in PATH: {e}");
            None
        }
    });

/// Runs the web-native bridge sync (`npx cap sync android`) from the
/// project root, copying web assets into the native project.
pub async fn sync_bridge(root: &Path) -> Result<()> {
    if !*HAS_NPX {
        crate::bail!("npx not available, cannot run bridge sync");
    }

    log::info!("Syncing native bridge (cap sync android)");
    let status = tokio::process::Command::new("npx")
        .args(["cap", "sync", "android"])
        .current_dir(root)
        .status()
        .await?;

    if !status.success() {
        return Err(BuildError::ToolFailed {
            tool: "npx cap sync android".to_string(),
            code: status.code(),
        });
    }
    Ok(())
}

/// Runs the Android debug build (`assembleDebug`) in the given project
/// directory, preferring the project's Gradle wrapper over a PATH install.
pub async fn build_native(android_dir: &Path) -> Result<()> {
    let gradle = gradle_command(android_dir)?;

    log::info!("Running Gradle build (assembleDebug)");
    let status = tokio::process::Command::new(&gradle)
        .arg("assembleDebug")
        .current_dir(android_dir)
        .status()
        .await?;

    if !status.success() {
        return Err(BuildError::ToolFailed {
            tool: gradle.display().to_string(),
            code: status.code(),
        });
    }

    log::info!("✓ Android build complete");
    Ok(())
}

fn gradle_command(android_dir: &Path) -> Result<PathBuf> {
    let wrapper = android_dir.join("gradlew");
    if wrapper.exists() {
        return Ok(wrapper);
    }
    GRADLE_ON_PATH
        .clone()
        .context("no gradlew wrapper and no gradle on PATH")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_is_preferred_over_path_install() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gradlew"), "#!/bin/sh\n").unwrap();
        let cmd = gradle_command(dir.path()).unwrap();
        assert_eq!(cmd, dir.path().join("gradlew"));
    }
}
