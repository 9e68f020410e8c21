//! Five-stage pipeline orchestration.
//!
//! Stages run strictly sequentially; each one's filesystem effects are
//! complete before the next begins. The first three stages gate success:
//! a stage-level error there ends the run. The native bridge sync and the
//! native build are tolerated — their failures are logged and the run
//! proceeds to completion.

use super::{PipelineReport, Stage, StageReport, TargetReport};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::icons::{IconGenerator, IconResizer};
use crate::package::Packager;
use crate::sync::Synchronizer;
use crate::{android, version};

/// Runs the fixed stage sequence over one [`BuildConfig`].
pub struct Orchestrator<'a> {
    config: &'a BuildConfig,
    resizer: &'a dyn IconResizer,
}

impl<'a> Orchestrator<'a> {
    /// Builds an orchestrator with an injected resize capability.
    pub fn new(config: &'a BuildConfig, resizer: &'a dyn IconResizer) -> Self {
        Self { config, resizer }
    }

    /// Executes the full pipeline and returns the aggregated report.
    ///
    /// The report, not this method, decides the exit code; see
    /// [`PipelineReport::exit_code`].
    pub async fn run(&self) -> PipelineReport {
        let mut report = PipelineReport::default();

        log::info!("[1/5] Syncing versions...");
        if !self.required_stage(&mut report, Stage::StampVersions, version::stamp_all(self.config))
        {
            return report;
        }

        log::info!("[2/5] Syncing core code...");
        let sync = Synchronizer::from_config(self.config);
        if !self.required_stage(&mut report, Stage::SyncCore, sync.sync_all().await) {
            return report;
        }

        log::info!("[3/5] Building extensions...");
        if !self.required_stage(
            &mut report,
            Stage::PackageExtensions,
            self.package_extensions().await,
        ) {
            return report;
        }

        log::info!("[4/5] Syncing native bridge...");
        match self.sync_native_bridge().await {
            Ok(reports) => report.push(StageReport::new(Stage::SyncNativeBridge, reports)),
            Err(e) => {
                log::warn!("Native bridge sync failed (maybe SDK missing?), continuing: {e}");
                report.push(StageReport::aborted(Stage::SyncNativeBridge, e.to_string()));
            }
        }

        log::info!("[5/5] Building native project...");
        match self.build_native().await {
            Ok(reports) => report.push(StageReport::new(Stage::BuildNative, reports)),
            Err(e) => {
                log::error!("Native build failed: {e}");
                report.push(StageReport::aborted(Stage::BuildNative, e.to_string()));
            }
        }

        log::info!("✓ Build process complete");
        report.log_summary();
        report
    }

    /// Records a required stage's outcome; returns false when the run must
    /// stop because the stage itself errored.
    fn required_stage(
        &self,
        report: &mut PipelineReport,
        stage: Stage,
        result: Result<Vec<TargetReport>>,
    ) -> bool {
        match result {
            Ok(reports) => {
                report.push(StageReport::new(stage, reports));
                true
            }
            Err(e) => {
                log::error!("{stage} failed: {e}");
                report.push(StageReport::aborted(stage, e.to_string()));
                false
            }
        }
    }

    /// Stage 3: per packaged target, generate icons then zip the tree.
    /// A failed target is reported and never blocks its siblings.
    async fn package_extensions(&self) -> Result<Vec<TargetReport>> {
        let generator = IconGenerator::from_config(self.config, self.resizer);
        let packager = Packager::new(self.config.build_dir.clone());

        let mut reports = Vec::new();
        for target in self.config.packaged_targets() {
            log::info!("Building {} extension...", target.name);

            match generator.generate(target) {
                Ok(mut icon_reports) => reports.append(&mut icon_reports),
                Err(e) => {
                    log::error!("Icon generation for {} failed: {e}", target.name);
                    reports.push(TargetReport::failed(
                        format!("{}:icons", target.name),
                        e.to_string(),
                    ));
                }
            }

            match packager.package(target).await {
                Ok(_) => reports.push(TargetReport::success(target.name.clone())),
                Err(e) => {
                    log::error!("Error packaging {}: {e}", target.name);
                    reports.push(TargetReport::failed(target.name.clone(), e.to_string()));
                }
            }
        }
        Ok(reports)
    }

    /// Stage 4: run the bridge sync when the native project exists.
    async fn sync_native_bridge(&self) -> Result<Vec<TargetReport>> {
        let Some(android_dir) = &self.config.android_dir else {
            return Ok(vec![TargetReport::skipped("android", "not configured")]);
        };
        if !android_dir.exists() {
            log::info!("Android directory not found, skipping.");
            return Ok(vec![TargetReport::skipped(
                "android",
                "project directory not found",
            )]);
        }

        android::bridge::sync_bridge(&self.config.root).await?;
        Ok(vec![TargetReport::success("android")])
    }

    /// Stage 5: patch plugin descriptors, then run the Gradle build.
    async fn build_native(&self) -> Result<Vec<TargetReport>> {
        let Some(android_dir) = &self.config.android_dir else {
            return Ok(vec![TargetReport::skipped("android", "not configured")]);
        };
        if !android_dir.exists() {
            log::info!("Android directory not found, skipping.");
            return Ok(vec![TargetReport::skipped(
                "android",
                "project directory not found",
            )]);
        }

        let mut reports = Vec::new();
        if let Some(plugins_dir) = &self.config.native_plugins_dir {
            log::info!("Patching plugin build descriptors...");
            reports.extend(android::patcher::patch_plugins(plugins_dir)?);
        }

        android::bridge::build_native(android_dir).await?;
        reports.push(TargetReport::success("android"));
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::RasterResizer;
    use crate::pipeline::Outcome;
    use std::path::Path;

    /// Lays out a minimal project in the stock shape, without the native
    /// bridge (no android directory, so stages 4-5 skip).
    fn seed_project(root: &Path, version: &str) {
        std::fs::write(
            root.join("package.json"),
            format!(r#"{{"name":"wird-reminder","version":"{version}"}}"#),
        )
        .unwrap();

        std::fs::create_dir_all(root.join("core/js")).unwrap();
        std::fs::write(root.join("core/js/app.js"), "export {};").unwrap();
        std::fs::write(
            root.join("core/js/env.js"),
            "export default { version: '0.0.0' };\n",
        )
        .unwrap();

        for target in ["chrome", "firefox", "www"] {
            std::fs::create_dir_all(root.join(target)).unwrap();
            std::fs::write(
                root.join(target).join("manifest.json"),
                r#"{"version":"0.0.0"}"#,
            )
            .unwrap();
        }
        std::fs::write(
            root.join("www/sw.js"),
            "const CACHE_NAME = 'wird-reminder-v0';\n",
        )
        .unwrap();

        // Pre-sized favicons for every configured size, so the pipeline
        // never needs to decode an image in tests
        std::fs::create_dir_all(root.join("favicon")).unwrap();
        for size in [16, 32, 48, 96, 128] {
            std::fs::write(
                root.join("favicon").join(format!("favicon-{size}x{size}.png")),
                format!("png-{size}"),
            )
            .unwrap();
        }
        std::fs::write(root.join("favicon/favicon-96x96.png"), "png-96").unwrap();
    }

    #[tokio::test]
    async fn full_run_stamps_syncs_and_packages() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        seed_project(root, "3.1.4");

        let config = BuildConfig::defaults(root);
        let resizer = RasterResizer;
        let report = Orchestrator::new(&config, &resizer).run().await;

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.stages.len(), 5);

        // Versions stamped everywhere
        for target in ["chrome", "firefox", "www"] {
            let text =
                std::fs::read_to_string(root.join(target).join("manifest.json")).unwrap();
            assert!(text.contains("\"version\": \"3.1.4\""));
        }

        // Core synced into each destination
        assert!(root.join("chrome/src/core/js/app.js").exists());
        assert!(root.join("firefox/src/core/js/app.js").exists());
        assert!(root.join("www/core/js/app.js").exists());

        // Extensions zipped under the configured names
        assert!(root.join("build/chrome-3.1.4.zip").exists());
        assert!(root.join("build/firefox-3.1.4.zip").exists());

        // Native stages skipped without an android directory
        let native = &report.stages[3];
        assert!(native.reports.iter().all(|r| r.outcome == Outcome::Skipped));
    }

    #[tokio::test]
    async fn missing_core_tree_aborts_before_packaging() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        seed_project(root, "1.0.0");
        std::fs::remove_dir_all(root.join("core")).unwrap();

        let config = BuildConfig::defaults(root);
        let resizer = RasterResizer;
        let report = Orchestrator::new(&config, &resizer).run().await;

        assert_eq!(report.exit_code(), 1);
        // Run stopped at the sync stage
        assert_eq!(report.stages.len(), 2);
        assert!(report.stages[1].aborted);
        assert!(!root.join("build").exists());
    }

    #[tokio::test]
    async fn missing_manifest_fails_one_target_but_packages_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        seed_project(root, "2.0.0");
        std::fs::remove_file(root.join("firefox/manifest.json")).unwrap();

        let config = BuildConfig::defaults(root);
        let resizer = RasterResizer;
        let report = Orchestrator::new(&config, &resizer).run().await;

        // Chrome still packaged
        assert!(root.join("build/chrome-2.0.0.zip").exists());

        // Firefox failure gates the run
        assert_eq!(report.exit_code(), 1);
        let packaging = &report.stages[2];
        assert!(
            packaging
                .reports
                .iter()
                .any(|r| r.target == "firefox" && r.outcome == Outcome::Failed)
        );
    }
}
