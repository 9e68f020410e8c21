//! Gradle descriptor patching for third-party plugins.
//!
//! Plugin projects pulled in by the native bridge ship with inconsistent
//! Java/Kotlin compiler targets. The patcher normalizes every reachable
//! `android/build.gradle` to a single JVM target: it strips any previously
//! injected compiler-compatibility and Kotlin-options blocks, injects a
//! fresh `compileOptions` block before the first `defaultConfig`, and, for
//! plugins applying the Kotlin Android plugin, appends a `KotlinCompile`
//! task-configuration block. Repeated runs are stable: the second pass
//! produces byte-identical output and writes nothing back.
//!
//! This is text substitution, not structural parsing; the strip-then-
//! reinject sequence is the contract that keeps it idempotent.

use crate::error::Result;
use crate::pipeline::TargetReport;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// JVM target injected into every descriptor.
const JVM_TARGET: &str = "17";

static COMPILE_OPTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*compileOptions\s*\{[^}]*\}\n?").expect("valid regex"));
static JVM_TOOLCHAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t]*kotlin\s*\{\s*jvmToolchain\(\d+\)\s*\}\n?").expect("valid regex")
});
static KOTLIN_TASK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^tasks\.withType\([^)]*KotlinCompile\)\.configureEach\s*\{.*?^\}\n?")
        .expect("valid regex")
});
static KOTLIN_OPTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*kotlinOptions\s*\{[^}]*\}\n?").expect("valid regex"));
static BLANK_RUNS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Normalizes one descriptor. Returns `None` when nothing changed.
pub fn patch_descriptor(content: &str) -> Option<String> {
    let mut text = content.to_string();

    // Strip previously injected blocks so re-runs never duplicate them.
    // The task block goes first: it contains a kotlinOptions block of its
    // own that the bare kotlinOptions strip would otherwise mangle.
    text = KOTLIN_TASK_RE.replace_all(&text, "").into_owned();
    text = COMPILE_OPTIONS_RE.replace_all(&text, "").into_owned();
    text = JVM_TOOLCHAIN_RE.replace_all(&text, "").into_owned();
    text = KOTLIN_OPTIONS_RE.replace_all(&text, "").into_owned();

    if let Some(pos) = text.find("defaultConfig {") {
        let block = format!(
            "compileOptions {{\n        sourceCompatibility JavaVersion.VERSION_{JVM_TARGET}\n        targetCompatibility JavaVersion.VERSION_{JVM_TARGET}\n    }}\n\n    "
        );
        text.insert_str(pos, &block);
    }

    if uses_kotlin_android(&text) {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&format!(
            "tasks.withType(org.jetbrains.kotlin.gradle.tasks.KotlinCompile).configureEach {{\n    kotlinOptions {{\n        jvmTarget = \"{JVM_TARGET}\"\n    }}\n}}\n"
        ));
    }

    // Collapse blank-line runs left behind by the strips
    loop {
        let collapsed = BLANK_RUNS_RE.replace_all(&text, "\n").into_owned();
        if collapsed == text {
            break;
        }
        text = collapsed;
    }

    (text != content).then_some(text)
}

fn uses_kotlin_android(content: &str) -> bool {
    content.contains("apply plugin: 'kotlin-android'")
        || content.contains("id \"org.jetbrains.kotlin.android\"")
}

/// Patches every plugin descriptor reachable under the dependency
/// directory. A plugin without an `android/build.gradle` is silently
/// skipped; files are written back only when their content changed.
pub fn patch_plugins(plugins_dir: &Path) -> Result<Vec<TargetReport>> {
    if !plugins_dir.is_dir() {
        log::debug!("Plugin directory not present: {}", plugins_dir.display());
        return Ok(Vec::new());
    }

    let mut reports = Vec::new();
    for entry in std::fs::read_dir(plugins_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let plugin = entry.file_name().to_string_lossy().into_owned();
        let descriptor = entry.path().join("android").join("build.gradle");
        if !descriptor.exists() {
            continue;
        }

        let content = std::fs::read_to_string(&descriptor)?;
        match patch_descriptor(&content) {
            Some(patched) => {
                std::fs::write(&descriptor, patched)?;
                log::info!("Patched: {}", descriptor.display());
                reports.push(TargetReport::success(plugin));
            }
            None => {
                log::debug!("Already normalized: {}", descriptor.display());
                reports.push(TargetReport::skipped(plugin, "no change"));
            }
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Outcome;

    const JAVA_PLUGIN: &str = "\
apply plugin: 'com.android.library'

android {
    compileSdkVersion 33

    defaultConfig {
        minSdkVersion 22
        targetSdkVersion 33
    }
}
";

    const KOTLIN_PLUGIN: &str = "\
apply plugin: 'com.android.library'
apply plugin: 'kotlin-android'

android {
    compileSdkVersion 33

    compileOptions {
        sourceCompatibility JavaVersion.VERSION_11
        targetCompatibility JavaVersion.VERSION_11
    }

    defaultConfig {
        minSdkVersion 22
    }

    kotlinOptions {
        jvmTarget = \"11\"
    }
}
";

    #[test]
    fn injects_compile_options_before_default_config() {
        let patched = patch_descriptor(JAVA_PLUGIN).unwrap();
        let compile_pos = patched.find("compileOptions {").unwrap();
        let config_pos = patched.find("defaultConfig {").unwrap();
        assert!(compile_pos < config_pos);
        assert!(patched.contains("sourceCompatibility JavaVersion.VERSION_17"));
        // No Kotlin plugin applied, so no task block is appended
        assert!(!patched.contains("tasks.withType"));
    }

    #[test]
    fn kotlin_plugin_gets_task_block_and_loses_old_targets() {
        let patched = patch_descriptor(KOTLIN_PLUGIN).unwrap();
        assert!(patched.contains("jvmTarget = \"17\""));
        assert!(!patched.contains("VERSION_11"));
        assert!(!patched.contains("jvmTarget = \"11\""));
        assert!(patched.contains(
            "tasks.withType(org.jetbrains.kotlin.gradle.tasks.KotlinCompile).configureEach {"
        ));
    }

    #[test]
    fn patching_is_idempotent() {
        for input in [JAVA_PLUGIN, KOTLIN_PLUGIN] {
            let once = patch_descriptor(input).unwrap();
            // Second pass reports no change
            assert_eq!(patch_descriptor(&once), None, "input: {input}");
        }
    }

    #[test]
    fn no_duplicate_blocks_after_repeated_runs() {
        let once = patch_descriptor(KOTLIN_PLUGIN).unwrap();
        let twice = patch_descriptor(&once).unwrap_or(once.clone());
        assert_eq!(twice.matches("compileOptions {").count(), 1);
        assert_eq!(twice.matches("tasks.withType").count(), 1);
    }

    #[test]
    fn patch_plugins_skips_missing_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let plugins = dir.path().join("@capacitor");

        // One plugin with a descriptor, one without
        std::fs::create_dir_all(plugins.join("app/android")).unwrap();
        std::fs::write(
            plugins.join("app/android/build.gradle"),
            JAVA_PLUGIN,
        )
        .unwrap();
        std::fs::create_dir_all(plugins.join("core")).unwrap();

        let reports = patch_plugins(&plugins).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, Outcome::Success);

        // Second run writes nothing back
        let reports = patch_plugins(&plugins).unwrap();
        assert_eq!(reports[0].outcome, Outcome::Skipped);
    }

    #[test]
    fn missing_plugin_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let reports = patch_plugins(&dir.path().join("nope")).unwrap();
        assert!(reports.is_empty());
    }
}
