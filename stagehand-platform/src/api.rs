//! Remote platform client interface.
//!
//! Every mutating operation on the platform is an asynchronous job on the
//! remote side; the client surfaces each as a [`Workflow`] that must be
//! awaited before a dependent step is safe to run. Implementations that
//! block inside the call (the `terminus` CLI does) hand back an
//! already-[`Resolved`] workflow, so the engine's control flow stays
//! ordinary sequential code over resolved results.

use std::fmt;

use stagehand_core::{Backup, Element, EnvId, Environment, SiteName};

use crate::error::PlatformError;

/// Connection mode of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    Git,
    Sftp,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::Git => write!(f, "git"),
            ConnectionMode::Sftp => write!(f, "sftp"),
        }
    }
}

/// A remote job to be waited on to completion.
pub trait Workflow {
    /// Block until the job finishes; `Err` means the job failed remotely.
    fn await_completion(self: Box<Self>) -> Result<(), PlatformError>;
}

/// A workflow whose outcome is already known at construction time.
pub struct Resolved(Result<(), PlatformError>);

impl Resolved {
    pub fn new(outcome: Result<(), PlatformError>) -> Box<dyn Workflow> {
        Box::new(Self(outcome))
    }

    pub fn ok() -> Box<dyn Workflow> {
        Self::new(Ok(()))
    }
}

impl Workflow for Resolved {
    fn await_completion(self: Box<Self>) -> Result<(), PlatformError> {
        self.0
    }
}

/// Site/environment operations on the hosting platform.
pub trait PlatformClient {
    /// Verify the client's own prerequisites (e.g. its CLI binary) before
    /// any mutation happens.
    fn preflight(&self) -> Result<(), PlatformError>;

    /// Create a new site, optionally under an organization and from an
    /// upstream.
    fn create_site(
        &self,
        site: &SiteName,
        org: Option<&str>,
        upstream: Option<&str>,
    ) -> Result<Box<dyn Workflow>, PlatformError>;

    /// All environments of a site as the platform reports them.
    fn environments(&self, site: &SiteName) -> Result<Vec<Environment>, PlatformError>;

    /// Ready-to-use git remote URL for an environment's code repository.
    fn git_remote_url(&self, site: &SiteName, env: &EnvId) -> Result<String, PlatformError>;

    fn set_connection_mode(
        &self,
        site: &SiteName,
        env: &EnvId,
        mode: ConnectionMode,
    ) -> Result<Box<dyn Workflow>, PlatformError>;

    /// Commits present in dev but not yet deployed to `env`.
    fn deployable_commits(&self, site: &SiteName, env: &EnvId) -> Result<u32, PlatformError>;

    /// Finished backups for one (environment, element).
    fn backups(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
    ) -> Result<Vec<Backup>, PlatformError>;

    /// Download URL of the latest finished backup, `None` when there is none.
    fn backup_url(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
    ) -> Result<Option<String>, PlatformError>;

    /// Start a backup; `element: None` backs up every element.
    fn create_backup(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Option<Element>,
    ) -> Result<Box<dyn Workflow>, PlatformError>;

    /// Import content from `url`; `Ok(false)` mirrors a non-zero exit of the
    /// import sub-invocation.
    fn import_content(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
        url: &str,
    ) -> Result<bool, PlatformError>;

    fn clear_cache(&self, site: &SiteName, env: &EnvId)
        -> Result<Box<dyn Workflow>, PlatformError>;

    /// Deploy pending code to `env`. Deploying to live promotes through test
    /// as part of the same remote job.
    fn deploy(
        &self,
        site: &SiteName,
        env: &EnvId,
        note: &str,
    ) -> Result<Box<dyn Workflow>, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_mode_wire_names() {
        assert_eq!(ConnectionMode::Git.to_string(), "git");
        assert_eq!(ConnectionMode::Sftp.to_string(), "sftp");
    }

    #[test]
    fn resolved_workflow_returns_its_outcome() {
        assert!(Resolved::ok().await_completion().is_ok());
        let failed = Resolved::new(Err(PlatformError::WorkflowFailed("conversion".into())));
        let err = failed.await_completion().expect_err("failed workflow");
        assert!(err.to_string().contains("conversion"));
    }
}
