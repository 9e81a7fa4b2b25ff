//! # stagehand-platform
//!
//! External collaborators behind narrow traits: the process executor that
//! runs shell commands ([`ProcessExecutor`]) and the remote platform client
//! ([`PlatformClient`]) whose asynchronous jobs are modeled as [`Workflow`]
//! values with an explicit `await_completion()` contract.
//!
//! The [`fakes`] module ships scripted/in-memory implementations used by
//! engine and CLI tests.

pub mod api;
pub mod error;
pub mod exec;
pub mod fakes;
pub mod terminus;

pub use api::{ConnectionMode, PlatformClient, Resolved, Workflow};
pub use error::{ExecError, PlatformError};
pub use exec::{ExecResult, ProcessExecutor, ShellExecutor};
pub use terminus::TerminusClient;
