//! Version stamping across targets.
//!
//! One authoritative version string lives in the project's JSON descriptor.
//! The stamper writes it into every per-target manifest, the Gradle build
//! descriptor (as `versionName` plus a derived integer `versionCode`), the
//! runtime-embedded version literal and the service-worker cache name.
//!
//! Stamping is best-effort across independent targets: a missing or
//! malformed target is reported and skipped, never aborting the others.
//! Running the stamper twice with the same version is byte-identical.

use crate::config::{BuildConfig, ManifestKind};
use crate::error::{BuildError, Result};
use crate::pipeline::TargetReport;
use regex::Regex;
use semver::Version;
use std::path::Path;
use std::sync::LazyLock;

static VERSION_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"versionCode \d+").expect("valid regex"));
static VERSION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"versionName "[^"]+""#).expect("valid regex"));
static RUNTIME_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"version: '[^']+'").expect("valid regex"));
static CACHE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"const CACHE_NAME = '[^']+';").expect("valid regex"));

/// Reads the authoritative version from a JSON descriptor's `version` field.
pub fn read_version(path: &Path) -> Result<Version> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let raw = value
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BuildError::MissingField {
            path: path.to_path_buf(),
            field: "version".to_string(),
        })?;
    Ok(Version::parse(raw)?)
}

/// Derives the integer Android build code from a version.
///
/// `X.Y.Z` maps to `X*10000 + Y*100 + Z`, so `1.2.3` becomes `10203`.
pub fn build_code(version: &Version) -> u64 {
    version.major * 10000 + version.minor * 100 + version.patch
}

/// Stamps the version into every configured location.
///
/// Returns one report per manifest target plus one for each auxiliary
/// location (runtime literal, cache name) that is configured.
pub fn stamp_all(config: &BuildConfig) -> Result<Vec<TargetReport>> {
    let version = read_version(&config.version_file)?;
    log::info!("Syncing version {version} across platforms");

    let mut reports = Vec::new();

    for target in &config.targets {
        let path = target.manifest.path();
        if !path.exists() {
            log::warn!("File not found: {}", path.display());
            reports.push(TargetReport::skipped(
                target.name.clone(),
                format!("manifest not found: {}", path.display()),
            ));
            continue;
        }

        let result = match &target.manifest {
            ManifestKind::Json { path, key } => stamp_json(path, key, &version),
            ManifestKind::Gradle { path } => stamp_gradle(path, &version),
        };

        match result {
            Ok(()) => {
                log::info!("Updated version in {}", path.display());
                reports.push(TargetReport::success(target.name.clone()));
            }
            Err(e) => {
                log::error!("Stamping {} failed: {e}", target.name);
                reports.push(TargetReport::failed(target.name.clone(), e.to_string()));
            }
        }
    }

    if let Some(path) = &config.runtime_version_file {
        reports.push(stamp_literal(path, "runtime-version", |text| {
            RUNTIME_VERSION_RE
                .replace(text, format!("version: '{version}'"))
                .into_owned()
        }));
    }

    if let Some(path) = &config.service_worker_file {
        let replacement = format!(
            "const CACHE_NAME = '{}-v{}';",
            config.cache_prefix, version
        );
        reports.push(stamp_literal(path, "service-worker", |text| {
            CACHE_NAME_RE.replace(text, replacement.as_str()).into_owned()
        }));
    }

    Ok(reports)
}

/// Rewrites a JSON manifest's version key, pretty-printed with stable
/// 2-space indentation.
pub fn stamp_json(path: &Path, key: &str, version: &Version) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let mut value: serde_json::Value = serde_json::from_str(&text)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| BuildError::Generic(format!("{} is not a JSON object", path.display())))?;
    object.insert(
        key.to_string(),
        serde_json::Value::String(version.to_string()),
    );
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    std::fs::write(path, out)?;
    Ok(())
}

/// Rewrites `versionCode` and `versionName` in a Gradle descriptor via
/// exact-pattern text substitution.
pub fn stamp_gradle(path: &Path, version: &Version) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let code = build_code(version);
    let text = VERSION_CODE_RE.replace(&text, format!("versionCode {code}"));
    let text = VERSION_NAME_RE.replace(&text, format!("versionName \"{version}\""));
    std::fs::write(path, text.as_ref())?;
    Ok(())
}

/// Applies a single-literal substitution to an auxiliary file, skipping
/// with a warning when the file is absent.
fn stamp_literal(path: &Path, label: &str, rewrite: impl Fn(&str) -> String) -> TargetReport {
    if !path.exists() {
        log::debug!("{label} file not present, skipping: {}", path.display());
        return TargetReport::skipped(label, format!("not present: {}", path.display()));
    }

    let result = std::fs::read_to_string(path)
        .map(|text| rewrite(&text))
        .and_then(|out| std::fs::write(path, out));

    match result {
        Ok(()) => {
            log::info!("Updated {label} in {}", path.display());
            TargetReport::success(label)
        }
        Err(e) => {
            log::error!("Updating {label} failed: {e}");
            TargetReport::failed(label, e.to_string())
        }
    }
}
