//! Error types for stagehand-core.

use thiserror::Error;

/// All errors that can arise from core domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A site name failed validation (empty, or contains whitespace).
    #[error("invalid site name '{0}': must be non-empty and contain no whitespace")]
    InvalidSiteName(String),

    /// A registered transform hook reported failure.
    #[error("hook '{name}' failed: {message}")]
    Hook { name: String, message: String },
}
