//! Pipeline configuration.
//!
//! Every stage receives an explicit [`BuildConfig`] instead of reading
//! ambient path state. The configuration is loaded from an optional
//! `wird.build.json` at the project root; when absent, [`BuildConfig::defaults`]
//! reproduces the stock project layout (chrome, firefox, www, android).

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up under the project root.
pub const CONFIG_FILE: &str = "wird.build.json";

/// Default exclusion patterns for packaging (VCS and OS metadata).
const DEFAULT_EXCLUDES: &[&str] = &["*.git*", "*.DS_Store", "Thumbs.db"];

/// How a target's manifest carries its version.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManifestKind {
    /// JSON manifest with a named version key, rewritten structurally.
    Json {
        /// Manifest path, relative to the project root.
        path: PathBuf,
        /// Version key to set.
        #[serde(default = "default_version_key")]
        key: String,
    },
    /// Gradle build descriptor, rewritten via text substitution.
    Gradle {
        /// Descriptor path, relative to the project root.
        path: PathBuf,
    },
}

fn default_version_key() -> String {
    "version".to_string()
}

impl ManifestKind {
    /// Path of the manifest file, relative to the project root.
    pub fn path(&self) -> &Path {
        match self {
            ManifestKind::Json { path, .. } => path,
            ManifestKind::Gradle { path } => path,
        }
    }
}

/// One packaged distribution: a browser extension, the installable web app,
/// or the native bridge project.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Target name, used for archive naming and reports.
    pub name: String,

    /// Destination of the core tree sync, if this target receives one.
    #[serde(default)]
    pub dest_dir: Option<PathBuf>,

    /// Root of the tree that gets packaged.
    pub root_dir: PathBuf,

    /// Manifest location and rewrite style.
    pub manifest: ManifestKind,

    /// Raster icon sizes this target needs.
    #[serde(default)]
    pub icon_sizes: Vec<u32>,

    /// Directory receiving generated icons.
    #[serde(default)]
    pub icons_dir: Option<PathBuf>,

    /// Glob patterns excluded from the archive.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether this target is zipped during the packaging stage.
    #[serde(default)]
    pub package: bool,
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

/// Full pipeline configuration.
///
/// All paths are absolute after [`BuildConfig::load`]; components never
/// consult the process working directory.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root.
    pub root: PathBuf,

    /// Canonical core source tree, mirrored into each target.
    pub core_dir: PathBuf,

    /// Authoritative version descriptor (JSON with a `version` field).
    pub version_file: PathBuf,

    /// Output directory for archives.
    pub build_dir: PathBuf,

    /// Directory holding pre-sized favicon assets.
    pub favicon_dir: PathBuf,

    /// High-resolution icon source used when no pre-sized asset matches.
    pub icon_fallback: PathBuf,

    /// Prefix of the service-worker cache name (`{prefix}-v{version}`).
    pub cache_prefix: String,

    /// Runtime config file carrying a `version: '...'` literal, if any.
    pub runtime_version_file: Option<PathBuf>,

    /// Service worker script carrying the `CACHE_NAME` literal, if any.
    pub service_worker_file: Option<PathBuf>,

    /// Directory of third-party native plugins whose Gradle descriptors
    /// get patched, if the native bridge is present.
    pub native_plugins_dir: Option<PathBuf>,

    /// Android project directory, if the native bridge is present.
    pub android_dir: Option<PathBuf>,

    /// Targets, in pipeline order.
    pub targets: Vec<TargetConfig>,
}

/// On-disk shape of `wird.build.json`. Every field is optional; omitted
/// fields fall back to the stock layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    core_dir: Option<PathBuf>,
    version_file: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    favicon_dir: Option<PathBuf>,
    icon_fallback: Option<PathBuf>,
    cache_prefix: Option<String>,
    runtime_version_file: Option<PathBuf>,
    service_worker_file: Option<PathBuf>,
    native_plugins_dir: Option<PathBuf>,
    android_dir: Option<PathBuf>,
    targets: Option<Vec<TargetConfig>>,
}

impl BuildConfig {
    /// Loads configuration for the given project root.
    ///
    /// Reads `config_path` when given, otherwise `{root}/wird.build.json`
    /// when present, otherwise the stock defaults.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let candidate = root.join(CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        let raw = match path {
            Some(path) => {
                log::debug!("Loading pipeline config from {}", path.display());
                let text = std::fs::read_to_string(&path)?;
                serde_json::from_str::<RawConfig>(&text)?
            }
            None => RawConfig::default(),
        };

        Ok(Self::from_raw(root, raw))
    }

    /// Stock configuration for the conventional project layout.
    pub fn defaults(root: &Path) -> Self {
        Self::from_raw(root, RawConfig::default())
    }

    fn from_raw(root: &Path, raw: RawConfig) -> Self {
        let join = |p: PathBuf| root.join(p);

        let targets = raw
            .targets
            .unwrap_or_else(default_targets)
            .into_iter()
            .map(|mut t| {
                t.dest_dir = t.dest_dir.map(&join);
                t.root_dir = join(t.root_dir);
                t.icons_dir = t.icons_dir.map(&join);
                t.manifest = match t.manifest {
                    ManifestKind::Json { path, key } => ManifestKind::Json {
                        path: join(path),
                        key,
                    },
                    ManifestKind::Gradle { path } => ManifestKind::Gradle { path: join(path) },
                };
                t
            })
            .collect();

        BuildConfig {
            root: root.to_path_buf(),
            core_dir: join(raw.core_dir.unwrap_or_else(|| "core".into())),
            version_file: join(raw.version_file.unwrap_or_else(|| "package.json".into())),
            build_dir: join(raw.build_dir.unwrap_or_else(|| "build".into())),
            favicon_dir: join(raw.favicon_dir.unwrap_or_else(|| "favicon".into())),
            icon_fallback: join(
                raw.icon_fallback
                    .unwrap_or_else(|| "favicon/favicon-96x96.png".into()),
            ),
            cache_prefix: raw.cache_prefix.unwrap_or_else(|| "wird-reminder".into()),
            runtime_version_file: Some(join(
                raw.runtime_version_file
                    .unwrap_or_else(|| "core/js/env.js".into()),
            )),
            service_worker_file: Some(join(
                raw.service_worker_file.unwrap_or_else(|| "www/sw.js".into()),
            )),
            native_plugins_dir: Some(join(
                raw.native_plugins_dir
                    .unwrap_or_else(|| "node_modules/@capacitor".into()),
            )),
            android_dir: Some(join(raw.android_dir.unwrap_or_else(|| "android".into()))),
            targets,
        }
    }

    /// Targets that receive a core tree sync.
    pub fn sync_destinations(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.iter().filter(|t| t.dest_dir.is_some())
    }

    /// Targets that get zipped during the packaging stage.
    pub fn packaged_targets(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.iter().filter(|t| t.package)
    }
}

fn default_targets() -> Vec<TargetConfig> {
    let json_manifest = |path: &str| ManifestKind::Json {
        path: path.into(),
        key: default_version_key(),
    };

    vec![
        TargetConfig {
            name: "chrome".into(),
            dest_dir: Some("chrome/src/core".into()),
            root_dir: "chrome".into(),
            manifest: json_manifest("chrome/manifest.json"),
            icon_sizes: vec![16, 32, 48, 128],
            icons_dir: Some("chrome/icons".into()),
            exclude: default_excludes(),
            package: true,
        },
        TargetConfig {
            name: "firefox".into(),
            dest_dir: Some("firefox/src/core".into()),
            root_dir: "firefox".into(),
            manifest: json_manifest("firefox/manifest.json"),
            icon_sizes: vec![16, 32, 48, 96],
            icons_dir: Some("firefox/icons".into()),
            exclude: default_excludes(),
            package: true,
        },
        TargetConfig {
            name: "www".into(),
            dest_dir: Some("www/core".into()),
            root_dir: "www".into(),
            manifest: json_manifest("www/manifest.json"),
            icon_sizes: vec![],
            icons_dir: None,
            exclude: default_excludes(),
            package: false,
        },
        TargetConfig {
            name: "android".into(),
            dest_dir: None,
            root_dir: "android".into(),
            manifest: ManifestKind::Gradle {
                path: "android/app/build.gradle".into(),
            },
            icon_sizes: vec![],
            icons_dir: None,
            exclude: default_excludes(),
            package: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_four_targets() {
        let config = BuildConfig::defaults(Path::new("/proj"));
        let names: Vec<&str> = config.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["chrome", "firefox", "www", "android"]);

        assert_eq!(config.core_dir, Path::new("/proj/core"));
        assert_eq!(config.version_file, Path::new("/proj/package.json"));
        assert_eq!(config.build_dir, Path::new("/proj/build"));
    }

    #[test]
    fn defaults_sync_three_destinations_and_package_two() {
        let config = BuildConfig::defaults(Path::new("/proj"));
        assert_eq!(config.sync_destinations().count(), 3);
        let packaged: Vec<&str> = config
            .packaged_targets()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(packaged, ["chrome", "firefox"]);
    }

    #[test]
    fn config_file_paths_resolve_against_root() {
        let dir = tempfile::tempdir().unwrap();
        let config_text = r#"{
            "core_dir": "shared",
            "targets": [
                {
                    "name": "chromium",
                    "dest_dir": "chromium/src/core",
                    "root_dir": "chromium",
                    "manifest": { "type": "json", "path": "chromium/manifest.json" },
                    "icon_sizes": [16, 48],
                    "icons_dir": "chromium/icons",
                    "package": true
                }
            ]
        }"#;
        std::fs::write(dir.path().join(CONFIG_FILE), config_text).unwrap();

        let config = BuildConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.core_dir, dir.path().join("shared"));
        assert_eq!(config.targets.len(), 1);
        let target = &config.targets[0];
        assert_eq!(target.root_dir, dir.path().join("chromium"));
        assert_eq!(
            target.manifest.path(),
            dir.path().join("chromium/manifest.json")
        );
        match &target.manifest {
            ManifestKind::Json { key, .. } => assert_eq!(key, "version"),
            other => panic!("expected json manifest, got {other:?}"),
        }
    }
}
