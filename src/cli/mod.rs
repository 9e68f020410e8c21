//! Command line interface for the build pipeline.

mod args;

pub use args::{Args, Command};

use crate::config::BuildConfig;
use crate::error::Result;
use crate::icons::{IconGenerator, RasterResizer};
use crate::package::Packager;
use crate::pipeline::{Orchestrator, PipelineReport, Stage, StageReport, TargetReport};
use crate::sync::Synchronizer;
use crate::{android, version};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let config = BuildConfig::load(&args.root, args.config.as_deref())?;

    match args.command {
        Command::Build => {
            let resizer = RasterResizer;
            let report = Orchestrator::new(&config, &resizer).run().await;
            Ok(report.exit_code())
        }
        Command::Version => {
            let reports = version::stamp_all(&config)?;
            Ok(single_stage_exit(Stage::StampVersions, reports))
        }
        Command::Sync => {
            let reports = Synchronizer::from_config(&config).sync_all().await?;
            Ok(single_stage_exit(Stage::SyncCore, reports))
        }
        Command::Icons => {
            let resizer = RasterResizer;
            let generator = IconGenerator::from_config(&config, &resizer);
            let mut reports = Vec::new();
            for target in config.packaged_targets() {
                reports.extend(generator.generate(target)?);
            }
            Ok(single_stage_exit(Stage::PackageExtensions, reports))
        }
        Command::Package => {
            let packager = Packager::new(config.build_dir.clone());
            let mut reports = Vec::new();
            for target in config.packaged_targets() {
                match packager.package(target).await {
                    Ok(_) => reports.push(TargetReport::success(target.name.clone())),
                    Err(e) => {
                        log::error!("Error packaging {}: {e}", target.name);
                        reports.push(TargetReport::failed(target.name.clone(), e.to_string()));
                    }
                }
            }
            Ok(single_stage_exit(Stage::PackageExtensions, reports))
        }
        Command::Patch => {
            let Some(plugins_dir) = &config.native_plugins_dir else {
                log::warn!("No native plugin directory configured");
                return Ok(0);
            };
            let reports = android::patcher::patch_plugins(plugins_dir)?;
            log::info!("Patched {} plugin descriptor(s)", reports.len());
            Ok(single_stage_exit(Stage::BuildNative, reports))
        }
    }
}

/// Exit code for a single stage run on its own.
fn single_stage_exit(stage: Stage, reports: Vec<TargetReport>) -> i32 {
    let mut report = PipelineReport::default();
    report.push(StageReport::new(stage, reports));
    report.log_summary();
    report.exit_code()
}
