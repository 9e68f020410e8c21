//! Error types for pipeline operations.
//!
//! One error enum covers the whole pipeline; helper traits attach
//! human-readable context to filesystem and lookup failures.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum BuildError {
    /// IO errors without path context
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO errors with the action and path that failed
    #[error("{action} {path}: {source}")]
    Fs {
        /// What the pipeline was doing
        action: String,
        /// Path the operation touched
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// JSON parse/serialize errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Version string parse errors
    #[error("invalid version: {0}")]
    Version(#[from] semver::Error),

    /// Archive creation errors
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Icon decode/encode errors
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Directory traversal errors
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid packaging exclusion pattern
    #[error("invalid exclusion pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A target's manifest file is absent (fatal for that target only)
    #[error("manifest not found for target '{target}': {path}")]
    MissingManifest {
        /// Target name
        target: String,
        /// Expected manifest path
        path: PathBuf,
    },

    /// A required field is absent from a JSON descriptor
    #[error("missing '{field}' field in {path}")]
    MissingField {
        /// Descriptor path
        path: PathBuf,
        /// Field name
        field: String,
    },

    /// An external tool exited unsuccessfully
    #[error("{tool} failed with exit code {code:?}")]
    ToolFailed {
        /// Tool name
        tool: String,
        /// Exit code, if the process terminated normally
        code: Option<i32>,
    },

    /// Free-form errors raised via [`bail!`](crate::bail)
    #[error("{0}")]
    Generic(String),
}

/// Return early with a [`BuildError::Generic`] built from format arguments.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::BuildError::Generic(format!($($arg)*)))
    };
}

/// Attach a message to `Option`/`Result` values, converting to [`BuildError`].
pub trait Context<T> {
    /// Convert to `Result`, using `msg` as the error message.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| BuildError::Generic(msg.to_string()))
    }
}

impl<T, E: std::error::Error> Context<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| BuildError::Generic(format!("{msg}: {e}")))
    }
}

/// Attach action and path context to IO results.
pub trait ErrorExt<T> {
    /// Convert an IO error into [`BuildError::Fs`] with the given context.
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::io::Result<T> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| BuildError::Fs {
            action: action.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}
