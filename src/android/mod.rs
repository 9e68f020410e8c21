//! Native bridge integration.
//!
//! Covers the two tolerated pipeline stages: syncing the web assets into
//! the native project via the bridge CLI, and building the Android project
//! after normalizing third-party plugin build descriptors.

pub mod bridge;
pub mod patcher;
