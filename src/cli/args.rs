//! Command line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multi-target build pipeline for the Wird Reminder app
#[derive(Parser, Debug)]
#[command(
    name = "wird-build",
    version,
    about = "Multi-target sync, version-stamp and packaging pipeline",
    long_about = "Builds the Wird Reminder app for all of its distribution targets.

Stamps one authoritative version across every platform manifest, mirrors the
canonical core tree into each target, generates extension icons, zips the
browser extensions, and runs the native bridge sync and Android build.

Usage:
  wird-build build
  wird-build --root ../app version
  wird-build package

Exit code 0 = all required stages (stamp, sync, package) succeeded."
)]
pub struct Args {
    /// Project root directory
    #[arg(long, default_value = ".", value_name = "DIR", global = true)]
    pub root: PathBuf,

    /// Pipeline configuration file (defaults to {root}/wird.build.json)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full five-stage pipeline
    Build,
    /// Stamp the authoritative version into every target
    Version,
    /// Mirror the core tree into each target destination
    Sync,
    /// Generate missing icons for packaged targets
    Icons,
    /// Zip each packaged target into build/{target}-{version}.zip
    Package,
    /// Normalize native plugin build descriptors
    Patch,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
