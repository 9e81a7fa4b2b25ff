//! # stagehand-engine
//!
//! The environment replication engine: backup-freshness validation,
//! deployable-commit accounting, the commit-partition planner, the git
//! history replicator that executes plans, the content replication driver,
//! and the orchestrating pipeline.
//!
//! Call [`pipeline::clone_site`] to clone a source site's dev/test/live
//! pipeline into a newly created target site.

pub mod accounting;
pub mod content;
pub mod error;
pub mod freshness;
pub mod pipeline;
pub mod planner;
pub mod replicator;

pub use content::{ContentStatus, EnvContentOutcome};
pub use error::CloneError;
pub use freshness::{BackupAudit, BackupClass};
pub use pipeline::{clone_site, CloneReport};
pub use planner::{DeployPlan, PipelineState, PlanStep};
