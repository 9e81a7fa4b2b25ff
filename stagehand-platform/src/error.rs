//! Error types for stagehand-platform.

use thiserror::Error;

use stagehand_core::Element;

/// Failures launching a subprocess. Non-zero exit status is not an error at
/// this layer; it is reported through `ExecResult::success`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// All errors that can arise from the remote platform client.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A platform CLI invocation exited non-zero.
    #[error("command '{command}' failed: {detail}")]
    Command { command: String, detail: String },

    /// Platform output could not be interpreted.
    #[error("unexpected output from '{command}': {detail}")]
    Parse { command: String, detail: String },

    /// A remote workflow completed unsuccessfully.
    #[error("remote workflow failed: {0}")]
    WorkflowFailed(String),

    /// A required external binary is not available.
    #[error("'{0}' is not available on PATH")]
    MissingBinary(&'static str),

    /// Content import was requested for an element it cannot handle.
    #[error("unsupported content element: {0}")]
    UnsupportedElement(Element),
}
