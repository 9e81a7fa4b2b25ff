//! # stagehand-core
//!
//! Domain types for stagehand: sites, environments, backups, the immutable
//! per-run context, and the transform hook registry.
//!
//! No I/O lives here; collaborators (process execution, the remote platform
//! API) are in `stagehand-platform`, and the replication engine itself is in
//! `stagehand-engine`.

pub mod context;
pub mod error;
pub mod hooks;
pub mod types;

pub use context::RunContext;
pub use error::CoreError;
pub use hooks::{HookArgs, TransformKind, TransformRegistry};
pub use types::{Backup, Element, EnvId, Environment, SiteName};
