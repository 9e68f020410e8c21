//! Per-target icon generation.
//!
//! Each target declares the raster icon sizes it needs. For every size the
//! generator works through a fallback chain: an icon already present at the
//! destination is never touched; otherwise a pre-sized favicon asset is
//! copied; otherwise the high-resolution source is resized through the
//! injected [`IconResizer`]; otherwise the source is copied unresized as a
//! degraded fallback. A size with no usable source is a warning, never a
//! failure.

use crate::config::{BuildConfig, TargetConfig};
use crate::error::Result;
use crate::pipeline::{Outcome, TargetReport};
use std::path::{Path, PathBuf};

/// Image-resize capability injected into the generator.
///
/// The production implementation is [`RasterResizer`]; tests substitute
/// in-memory fakes, which keeps the fallback chain testable without
/// decoding real images.
pub trait IconResizer: Send + Sync {
    /// Whether resizing can be attempted at all.
    fn is_available(&self) -> bool;

    /// Produces `dest` at exactly `size`x`size` pixels from `src`.
    fn resize(&self, src: &Path, dest: &Path, size: u32) -> Result<()>;
}

/// In-process resizer backed by the `image` crate.
#[derive(Debug, Default)]
pub struct RasterResizer;

impl IconResizer for RasterResizer {
    fn is_available(&self) -> bool {
        true
    }

    fn resize(&self, src: &Path, dest: &Path, size: u32) -> Result<()> {
        let resized =
            image::open(src)?.resize_exact(size, size, image::imageops::FilterType::Lanczos3);
        resized.save(dest)?;
        Ok(())
    }
}

/// Generates the icon set for one target at a time.
pub struct IconGenerator<'a> {
    favicon_dir: PathBuf,
    fallback_source: PathBuf,
    resizer: &'a dyn IconResizer,
}

impl<'a> IconGenerator<'a> {
    /// Builds a generator from the pipeline configuration.
    pub fn from_config(config: &BuildConfig, resizer: &'a dyn IconResizer) -> Self {
        Self {
            favicon_dir: config.favicon_dir.clone(),
            fallback_source: config.icon_fallback.clone(),
            resizer,
        }
    }

    /// Generates every missing icon for the target.
    ///
    /// Existing destination icons are left untouched.
    pub fn generate(&self, target: &TargetConfig) -> Result<Vec<TargetReport>> {
        let Some(icons_dir) = &target.icons_dir else {
            return Ok(Vec::new());
        };
        if !target.icon_sizes.is_empty() {
            std::fs::create_dir_all(icons_dir)?;
        }

        let mut reports = Vec::with_capacity(target.icon_sizes.len());
        for &size in &target.icon_sizes {
            reports.push(self.generate_one(&target.name, icons_dir, size));
        }
        Ok(reports)
    }

    fn generate_one(&self, target: &str, icons_dir: &Path, size: u32) -> TargetReport {
        let item = format!("{target}:icon-{size}");
        let dest = icons_dir.join(format!("icon-{size}.png"));

        if dest.exists() {
            log::debug!("Icon already present, leaving untouched: {}", dest.display());
            return TargetReport::skipped(item, "already present");
        }

        // Prefer a pre-sized asset over any resizing
        let presized = self
            .favicon_dir
            .join(format!("favicon-{size}x{size}.png"));
        if presized.exists() {
            return match std::fs::copy(&presized, &dest) {
                Ok(_) => {
                    log::info!("Copied existing icon: icon-{size}.png");
                    TargetReport::success(item)
                }
                Err(e) => TargetReport::failed(item, e.to_string()),
            };
        }

        if self.resizer.is_available() && self.fallback_source.exists() {
            match self.resizer.resize(&self.fallback_source, &dest, size) {
                Ok(()) => {
                    log::info!("Generated icon: icon-{size}.png");
                    return TargetReport::success(item);
                }
                Err(e) => {
                    log::warn!("Failed to generate icon-{size}.png: {e}");
                }
            }
        }

        if self.fallback_source.exists() {
            return match std::fs::copy(&self.fallback_source, &dest) {
                Ok(_) => {
                    log::warn!(
                        "Copied fallback icon unresized: icon-{size}.png (resize manually recommended)"
                    );
                    TargetReport {
                        target: item,
                        outcome: Outcome::Success,
                        detail: Some("unresized fallback, manual correction needed".into()),
                    }
                }
                Err(e) => TargetReport::failed(item, e.to_string()),
            };
        }

        log::warn!("No source icon found for size {size}");
        TargetReport::skipped(item, format!("no source icon for size {size}"))
    }
}
