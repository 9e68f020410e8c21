//! Pipeline stages and structured run reports.
//!
//! Every stage returns per-target [`TargetReport`]s instead of logging and
//! swallowing errors in place; the orchestrator's continue/abort decision
//! and the process exit code are pure functions over the aggregated
//! [`PipelineReport`].

mod orchestrator;

pub use orchestrator::Orchestrator;

use std::fmt;

/// The five fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Stamp the authoritative version into every derived location.
    StampVersions,
    /// Mirror the core tree into each target.
    SyncCore,
    /// Generate icons and zip the extension targets.
    PackageExtensions,
    /// Run the web-native bridge sync (tolerated).
    SyncNativeBridge,
    /// Patch plugin descriptors and run the native build (tolerated).
    BuildNative,
}

impl Stage {
    /// Whether a failure in this stage gates the run's success.
    ///
    /// Only the first three stages do; the native bridge sync and the
    /// native build are logged and tolerated.
    pub fn required(&self) -> bool {
        matches!(
            self,
            Stage::StampVersions | Stage::SyncCore | Stage::PackageExtensions
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::StampVersions => "stamp-versions",
            Stage::SyncCore => "sync-core",
            Stage::PackageExtensions => "package-extensions",
            Stage::SyncNativeBridge => "sync-native-bridge",
            Stage::BuildNative => "build-native",
        };
        f.write_str(name)
    }
}

/// Outcome of one target within one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target was processed fully.
    Success,
    /// A missing input made the target a no-op (warning, not failure).
    Skipped,
    /// The target failed; siblings were still processed.
    Failed,
}

/// Result of one target within one stage.
#[derive(Debug, Clone)]
pub struct TargetReport {
    /// Target (or item) name.
    pub target: String,
    /// Outcome for this target.
    pub outcome: Outcome,
    /// Human-readable detail, set for skips and failures.
    pub detail: Option<String>,
}

impl TargetReport {
    /// A fully processed target.
    pub fn success(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            outcome: Outcome::Success,
            detail: None,
        }
    }

    /// A target skipped over a missing input.
    pub fn skipped(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            outcome: Outcome::Skipped,
            detail: Some(detail.into()),
        }
    }

    /// A failed target.
    pub fn failed(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            outcome: Outcome::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// All target results for one stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Which stage produced these results.
    pub stage: Stage,
    /// Per-target results, in processing order.
    pub reports: Vec<TargetReport>,
    /// Set when the stage itself errored before finishing its targets.
    pub aborted: bool,
}

impl StageReport {
    /// A completed stage with the given per-target results.
    pub fn new(stage: Stage, reports: Vec<TargetReport>) -> Self {
        Self {
            stage,
            reports,
            aborted: false,
        }
    }

    /// A stage that errored outright.
    pub fn aborted(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            reports: vec![TargetReport::failed("*", detail)],
            aborted: true,
        }
    }

    fn has_failure(&self) -> bool {
        self.aborted || self.reports.iter().any(|r| r.outcome == Outcome::Failed)
    }
}

/// Aggregated results of a full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Stage reports, in execution order.
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Records a stage's results.
    pub fn push(&mut self, stage: StageReport) {
        self.stages.push(stage);
    }

    /// Whether any required stage carries a failure.
    pub fn has_gating_failure(&self) -> bool {
        self.stages
            .iter()
            .any(|s| s.stage.required() && s.has_failure())
    }

    /// Process exit code for this run.
    ///
    /// Only stages 1-3 gate success; skipped targets and tolerated-stage
    /// failures never do.
    pub fn exit_code(&self) -> i32 {
        if self.has_gating_failure() { 1 } else { 0 }
    }

    /// Logs a one-line summary per stage.
    pub fn log_summary(&self) {
        for stage in &self.stages {
            let ok = stage
                .reports
                .iter()
                .filter(|r| r.outcome == Outcome::Success)
                .count();
            let skipped = stage
                .reports
                .iter()
                .filter(|r| r.outcome == Outcome::Skipped)
                .count();
            let failed = stage
                .reports
                .iter()
                .filter(|r| r.outcome == Outcome::Failed)
                .count();
            log::info!(
                "{}: {} ok, {} skipped, {} failed",
                stage.stage,
                ok,
                skipped,
                failed
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_never_gate_success() {
        let mut report = PipelineReport::default();
        report.push(StageReport::new(
            Stage::StampVersions,
            vec![
                TargetReport::success("chrome"),
                TargetReport::skipped("android", "descriptor not found"),
            ],
        ));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn required_stage_failure_is_nonzero() {
        let mut report = PipelineReport::default();
        report.push(StageReport::new(
            Stage::PackageExtensions,
            vec![
                TargetReport::success("chrome"),
                TargetReport::failed("firefox", "manifest not found"),
            ],
        ));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn tolerated_stage_failure_is_zero() {
        let mut report = PipelineReport::default();
        report.push(StageReport::new(
            Stage::SyncCore,
            vec![TargetReport::success("www")],
        ));
        report.push(StageReport::aborted(Stage::BuildNative, "gradle missing"));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn required_stage_abort_is_nonzero() {
        let mut report = PipelineReport::default();
        report.push(StageReport::aborted(
            Stage::PackageExtensions,
            "cannot create build dir",
        ));
        assert_eq!(report.exit_code(), 1);
    }
}
