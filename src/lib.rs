//! Build pipeline library for the Wird Reminder app.
//!
//! Provides the components behind the `wird-build` binary:
//! - version stamping across platform manifests
//! - core source tree synchronization
//! - icon generation with a resize fallback chain
//! - extension packaging into versioned zip archives
//! - native plugin descriptor patching and the Android build stages
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod android;
pub mod cli;
pub mod config;
pub mod error;
pub mod icons;
pub mod package;
pub mod pipeline;
pub mod sync;
pub mod version;

// Re-export commonly used types
pub use error::{BuildError, Context, ErrorExt, Result};
