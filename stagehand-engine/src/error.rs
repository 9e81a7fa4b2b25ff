//! Error types for stagehand-engine.

use thiserror::Error;

use stagehand_core::{CoreError, Element, EnvId};
use stagehand_platform::{ExecError, PlatformError};

/// All errors that can abort (or, for content imports, be recorded during) a
/// clone run.
#[derive(Debug, Error)]
pub enum CloneError {
    /// Bad input; raised before any mutation occurs.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required external tool is absent; raised before any mutation.
    #[error("missing prerequisite: {0}")]
    Prerequisite(String),

    /// Remediation backup creation failed. Missing/stale backups themselves
    /// are not errors; they trigger remediation.
    #[error("backup creation failed for {env}/{scope}: {source}")]
    Backup {
        env: EnvId,
        /// Element name, or `all` for a whole-environment backup.
        scope: String,
        #[source]
        source: PlatformError,
    },

    /// A git step exited non-zero. Always fatal: repository state after a
    /// failed reset/push is not safely retryable.
    #[error("git step '{command}' failed: {detail}")]
    Git { command: String, detail: String },

    /// A content import sub-invocation exited non-zero. Recorded per
    /// environment; does not abort later environments.
    #[error("content import failed for {env}/{element}: {detail}")]
    ContentImport {
        env: EnvId,
        element: Element,
        detail: String,
    },

    /// A remote deploy job failed. Fatal.
    #[error("deploy to {env} failed: {source}")]
    Deploy {
        env: EnvId,
        #[source]
        source: PlatformError,
    },

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("process execution error: {0}")]
    Exec(#[from] ExecError),

    #[error("transform hook error: {0}")]
    Hook(#[from] CoreError),

    /// Local filesystem failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`CloneError::Io`].
pub(crate) fn io_err(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> CloneError {
    CloneError::Io {
        path: path.into(),
        source,
    }
}
