//! wird-build - multi-target build pipeline for the Wird Reminder app.
//!
//! This binary stamps versions, mirrors the core source tree into every
//! target, packages the browser extensions and drives the native bridge
//! stages, communicating success only via exit code and console output.

use std::process;

#[tokio::main]
async fn main() {
    // Stage progress is part of the user-facing output, so default to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match wird_build::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    process::exit(exit_code);
}
