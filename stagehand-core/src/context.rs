//! Immutable per-run context.
//!
//! Built once at entry from validated CLI flags and passed by reference to
//! every component. Nothing in the run mutates it; in particular
//! `started_at` is captured a single time so one run evaluates backup
//! freshness against a single consistent "now".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::types::SiteName;

/// Everything a clone run needs to know, fixed at process start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub source: SiteName,
    pub target: SiteName,
    /// Organization the target site is created under, when given.
    pub org: Option<String>,
    /// Upstream the target site is created from, when given.
    pub upstream: Option<String>,
    /// `--source-site-git-depth`: shallow-clone depth for the source repo.
    pub source_git_depth: Option<u32>,
    /// `--target-site-git-depth`: shallow-clone depth for the target repo.
    pub target_git_depth: Option<u32>,
    /// `--source-site-backup`: back up every initialized environment
    /// unconditionally instead of auditing freshness.
    pub force_backups: bool,
    /// Hook names excluded from this run (`--no-custom`).
    pub skip_hooks: BTreeSet<String>,
    /// `--debug-git`: echo git commands and preserve the work directory.
    pub debug_git: bool,
    /// Run start time; the single freshness reference point.
    pub started_at: DateTime<Utc>,
    /// Root under which per-site working clones live.
    pub work_root: PathBuf,
}

impl RunContext {
    /// Working clone path for a site under this run's work root.
    pub fn work_dir(&self, site: &SiteName) -> PathBuf {
        self.work_root.join(&site.0)
    }

    /// Working clone path for the source repository.
    pub fn source_work_dir(&self) -> PathBuf {
        self.work_dir(&self.source)
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }
}
