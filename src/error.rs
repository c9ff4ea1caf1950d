//! Error types for i2i-eval operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::artifacts::ResolutionFailure;

/// Result type alias for i2i-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during checkpoint evaluation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No checkpoint directory was found under the search root.
    ///
    /// Recoverable at the CLI level by passing an explicit checkpoint path.
    #[error("no checkpoint directory found under {searched} (expected a subdirectory named `{prefix}*`)", prefix = crate::checkpoint::CHECKPOINT_PREFIX)]
    CheckpointNotFound {
        /// Directory that was searched for checkpoints.
        searched: PathBuf,
    },

    /// No evaluation-array layout matched during artifact resolution.
    ///
    /// Fatal for the whole run. The payload lists every candidate root that
    /// was tried and what was actually on disk.
    #[error("{0}")]
    Resolution(ResolutionFailure),

    /// The translation collaborator exited with a non-zero status.
    ///
    /// Fatal; the diagnostic stream is carried verbatim. Artifact resolution
    /// must not be attempted after this.
    #[error("translation step failed with status {status}:\n{diagnostic}")]
    Translation {
        /// Exit status reported by the collaborator.
        status: i32,
        /// Captured error stream, verbatim.
        diagnostic: String,
    },

    /// Failed to load a sample image file.
    #[error("image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to load or parse an array container file.
    #[error("array load failed: {path}: {reason}")]
    ArrayLoad {
        /// Path to the array file that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Error composing or writing a rendered comparison.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
