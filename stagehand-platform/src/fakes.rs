//! In-memory collaborators for tests.
//!
//! Consumed by this crate's own tests and by `stagehand-engine`/CLI tests,
//! so they live in the library rather than behind `#[cfg(test)]`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use stagehand_core::{Backup, Element, EnvId, Environment, SiteName};

use crate::api::{ConnectionMode, PlatformClient, Resolved, Workflow};
use crate::error::{ExecError, PlatformError};
use crate::exec::{ExecResult, ProcessExecutor};

// ---------------------------------------------------------------------------
// ScriptedExecutor
// ---------------------------------------------------------------------------

/// Executor that records every invocation and answers from a script.
///
/// The first response whose needle substring occurs in the joined command
/// line wins; unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<String>>,
    responses: Vec<(String, ExecResult)>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `needle` with `result`.
    pub fn respond(mut self, needle: &str, result: ExecResult) -> Self {
        self.responses.push((needle.to_owned(), result));
        self
    }

    /// Make commands containing `needle` exit non-zero.
    pub fn fail_matching(self, needle: &str) -> Self {
        self.respond(
            needle,
            ExecResult {
                success: false,
                stdout: vec![],
                stderr: vec![format!("scripted failure for '{needle}'")],
            },
        )
    }

    /// Every recorded command line, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl ProcessExecutor for ScriptedExecutor {
    fn run(&self, args: &[String], _cwd: Option<&Path>) -> Result<ExecResult, ExecError> {
        let line = args.join(" ");
        self.calls.lock().expect("calls lock").push(line.clone());
        for (needle, result) in &self.responses {
            if line.contains(needle.as_str()) {
                return Ok(result.clone());
            }
        }
        Ok(ExecResult {
            success: true,
            stdout: vec![],
            stderr: vec![],
        })
    }
}

// ---------------------------------------------------------------------------
// FakePlatform
// ---------------------------------------------------------------------------

/// In-memory platform: configured with environments/backups up front, records
/// every mutating call in order for assertions.
#[derive(Default)]
pub struct FakePlatform {
    pub environments: Vec<Environment>,
    pub backups: Vec<Backup>,
    /// Resolvable latest-backup URLs per (environment, element).
    pub backup_urls: BTreeMap<(EnvId, Element), String>,
    /// Git remote URL per site; sites absent here get a synthetic URL.
    pub git_urls: BTreeMap<SiteName, String>,
    /// (env, element) pairs whose import exits non-zero.
    pub failing_imports: BTreeSet<(EnvId, Element)>,
    /// Environment whose deploy workflow fails remotely.
    pub failing_deploy: Option<EnvId>,
    log: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new(environments: Vec<Environment>) -> Self {
        Self {
            environments,
            ..Self::default()
        }
    }

    /// Every recorded platform call, in invocation order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().expect("log lock").push(entry);
    }

    fn env(&self, id: &EnvId) -> Option<&Environment> {
        self.environments.iter().find(|e| &e.id == id)
    }
}

impl PlatformClient for FakePlatform {
    fn preflight(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn create_site(
        &self,
        site: &SiteName,
        org: Option<&str>,
        upstream: Option<&str>,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        self.record(format!(
            "site:create {site} org={} upstream={}",
            org.unwrap_or("-"),
            upstream.unwrap_or("-")
        ));
        Ok(Resolved::ok())
    }

    fn environments(&self, _site: &SiteName) -> Result<Vec<Environment>, PlatformError> {
        Ok(self.environments.clone())
    }

    fn git_remote_url(&self, site: &SiteName, _env: &EnvId) -> Result<String, PlatformError> {
        Ok(self
            .git_urls
            .get(site)
            .cloned()
            .unwrap_or_else(|| format!("ssh://codeserver/{site}.git")))
    }

    fn set_connection_mode(
        &self,
        site: &SiteName,
        env: &EnvId,
        mode: ConnectionMode,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        self.record(format!("connection:set {site}.{env} {mode}"));
        Ok(Resolved::ok())
    }

    fn deployable_commits(&self, _site: &SiteName, env: &EnvId) -> Result<u32, PlatformError> {
        Ok(self
            .env(env)
            .and_then(|e| e.deployable_commits)
            .unwrap_or(0))
    }

    fn backups(
        &self,
        _site: &SiteName,
        env: &EnvId,
        element: Element,
    ) -> Result<Vec<Backup>, PlatformError> {
        Ok(self
            .backups
            .iter()
            .filter(|b| &b.env == env && b.element == element)
            .cloned()
            .collect())
    }

    fn backup_url(
        &self,
        _site: &SiteName,
        env: &EnvId,
        element: Element,
    ) -> Result<Option<String>, PlatformError> {
        Ok(self.backup_urls.get(&(env.clone(), element)).cloned())
    }

    fn create_backup(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Option<Element>,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        let scope = element.map_or_else(|| "all".to_owned(), |e| e.to_string());
        self.record(format!("backup:create {site}.{env} {scope}"));
        Ok(Resolved::ok())
    }

    fn import_content(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
        url: &str,
    ) -> Result<bool, PlatformError> {
        self.record(format!("import {site}.{env} {element} {url}"));
        Ok(!self.failing_imports.contains(&(env.clone(), element)))
    }

    fn clear_cache(
        &self,
        site: &SiteName,
        env: &EnvId,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        self.record(format!("clear-cache {site}.{env}"));
        Ok(Resolved::ok())
    }

    fn deploy(
        &self,
        site: &SiteName,
        env: &EnvId,
        note: &str,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        self.record(format!("deploy {site}.{env} note={note}"));
        if self.failing_deploy.as_ref() == Some(env) {
            return Ok(Resolved::new(Err(PlatformError::WorkflowFailed(format!(
                "deploy to {env} failed remotely"
            )))));
        }
        Ok(Resolved::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_executor_records_and_matches() {
        let exec = ScriptedExecutor::new().fail_matching("reset --hard");
        let ok = exec
            .run(&["git".into(), "pull".into()], None)
            .expect("run");
        assert!(ok.success);

        let failed = exec
            .run(
                &["git".into(), "reset".into(), "--hard".into(), "HEAD~2".into()],
                None,
            )
            .expect("run");
        assert!(!failed.success);

        assert_eq!(exec.calls(), vec!["git pull", "git reset --hard HEAD~2"]);
    }

    #[test]
    fn fake_platform_serves_counts_from_environments() {
        let platform = FakePlatform::new(vec![
            Environment {
                id: EnvId::Test,
                initialized: true,
                deployable_commits: Some(2),
            },
            Environment {
                id: EnvId::Live,
                initialized: true,
                deployable_commits: None,
            },
        ]);
        let site = SiteName::from("s");
        assert_eq!(platform.deployable_commits(&site, &EnvId::Test).unwrap(), 2);
        assert_eq!(platform.deployable_commits(&site, &EnvId::Live).unwrap(), 0);
    }

    #[test]
    fn fake_platform_logs_mutations_in_order() {
        let platform = FakePlatform::default();
        let site = SiteName::from("s");
        platform
            .create_backup(&site, &EnvId::Test, Some(Element::Database))
            .unwrap()
            .await_completion()
            .unwrap();
        platform
            .deploy(&site, &EnvId::Live, "clone")
            .unwrap()
            .await_completion()
            .unwrap();
        assert_eq!(
            platform.log(),
            vec!["backup:create s.test database", "deploy s.live note=clone"]
        );
    }
}
