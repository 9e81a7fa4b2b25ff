//! Git history replicator.
//!
//! Executes a [`DeployPlan`] against a working directory holding the
//! target's clone, with the source's latest commit as the starting merge
//! base. Each git invocation is one atomic step: a non-zero exit aborts the
//! whole clone with [`CloneError::Git`] — the working tree is not guaranteed
//! consistent for retry after a failed reset or push.

use std::path::{Path, PathBuf};

use stagehand_core::SiteName;
use stagehand_platform::{ExecResult, PlatformClient, ProcessExecutor};

use crate::error::{io_err, CloneError};
use crate::planner::{DeployPlan, PlanStep};

/// Branch the plan operates on; the platform deploys from it.
pub const WORK_BRANCH: &str = "master";
/// Remote name of the target repository (the clone origin).
const TARGET_REMOTE: &str = "origin";
/// Remote name added for the source repository.
const SOURCE_REMOTE: &str = "source";

/// Executes plans against one exclusively-owned working clone.
pub struct GitReplicator<'e> {
    exec: &'e dyn ProcessExecutor,
    work_dir: PathBuf,
}

impl<'e> GitReplicator<'e> {
    pub fn new(exec: &'e dyn ProcessExecutor, work_dir: PathBuf) -> Self {
        Self { exec, work_dir }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Bring the working clone up to date: clone the target repository (or
    /// pull when a clone already exists), then point the work branch at the
    /// source's latest commit.
    pub fn prepare(
        &self,
        target_url: &str,
        target_depth: Option<u32>,
        source_url: &str,
        source_depth: Option<u32>,
    ) -> Result<(), CloneError> {
        self.clone_or_pull(target_url, target_depth)?;

        // Refresh the source remote; removal fails harmlessly when absent.
        let _ = self.git_tolerant(&["remote", "remove", SOURCE_REMOTE]);
        self.git(&["remote", "add", SOURCE_REMOTE, source_url])?;

        let depth_arg = source_depth.map(|n| format!("--depth={n}"));
        let mut fetch = vec!["fetch", SOURCE_REMOTE, WORK_BRANCH];
        if let Some(arg) = depth_arg.as_deref() {
            fetch.push(arg);
        }
        self.git(&fetch)?;

        self.git(&["checkout", "-B", WORK_BRANCH])?;
        self.git(&["reset", "--hard", "FETCH_HEAD"])?;
        Ok(())
    }

    /// Clone into the work dir, or refresh with a pull when a working copy
    /// already exists. A fresh clone is depth-limited when `depth` is given.
    pub fn clone_or_pull(&self, url: &str, depth: Option<u32>) -> Result<(), CloneError> {
        if self.work_dir.join(".git").exists() {
            tracing::info!("refreshing existing clone at {}", self.work_dir.display());
            self.git(&["pull"])?;
            return Ok(());
        }

        if let Some(parent) = self.work_dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let depth_arg = depth.map(|n| format!("--depth={n}"));
        let dir = self.work_dir.to_string_lossy().to_string();
        let mut args = vec!["clone"];
        if let Some(arg) = depth_arg.as_deref() {
            args.push(arg);
        }
        args.push(url);
        args.push(&dir);
        run_git(self.exec, None, &args)?;
        Ok(())
    }

    /// Execute every step of `plan` in order. Deploy steps are dispatched to
    /// the platform and awaited; everything else is a git invocation in the
    /// working clone.
    pub fn execute(
        &self,
        plan: &DeployPlan,
        platform: &dyn PlatformClient,
        target: &SiteName,
        deploy_note: &str,
    ) -> Result<(), CloneError> {
        for step in &plan.steps {
            tracing::info!("plan step: {step}");
            match step {
                // `-f`: a snapshot branch may survive an aborted earlier run
                // in a reused clone.
                PlanStep::CreateBranch(name) => self.git(&["branch", "-f", name])?,
                PlanStep::CheckoutBranch(name) => self.git(&["checkout", name])?,
                PlanStep::ResetToCommitsAgo(n) => {
                    self.git(&["reset", "--hard", &format!("HEAD~{n}")])?
                }
                PlanStep::ForcePush => {
                    self.git(&["push", TARGET_REMOTE, WORK_BRANCH, "--force"])?
                }
                PlanStep::Push => self.git(&["push", TARGET_REMOTE, WORK_BRANCH])?,
                PlanStep::MergeBranch(name) => self.git(&["merge", name])?,
                PlanStep::Deploy(env) => {
                    platform
                        .deploy(target, env, deploy_note)?
                        .await_completion()
                        .map_err(|source| CloneError::Deploy {
                            env: env.clone(),
                            source,
                        })?;
                    continue;
                }
            };
        }
        Ok(())
    }

    /// Best-effort work tree removal; failures are logged, never escalated —
    /// they cannot affect the already-completed replication.
    pub fn remove_work_tree(&self) -> bool {
        match std::fs::remove_dir_all(&self.work_dir) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(
                    "failed to remove work tree {}: {e}",
                    self.work_dir.display()
                );
                false
            }
        }
    }

    fn git(&self, args: &[&str]) -> Result<ExecResult, CloneError> {
        run_git(self.exec, Some(&self.work_dir), args)
    }

    /// Like [`Self::git`] but a non-zero exit is returned, not an error.
    fn git_tolerant(&self, args: &[&str]) -> Result<ExecResult, CloneError> {
        let argv = git_argv(args);
        Ok(self.exec.run(&argv, Some(&self.work_dir))?)
    }
}

fn git_argv(args: &[&str]) -> Vec<String> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("git".to_owned());
    argv.extend(args.iter().map(|s| s.to_string()));
    argv
}

fn run_git(
    exec: &dyn ProcessExecutor,
    cwd: Option<&Path>,
    args: &[&str],
) -> Result<ExecResult, CloneError> {
    let argv = git_argv(args);
    let result = exec.run(&argv, cwd)?;
    if !result.success {
        return Err(CloneError::Git {
            command: argv.join(" "),
            detail: result.stderr.join("\n"),
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::EnvId;
    use stagehand_platform::fakes::{FakePlatform, ScriptedExecutor};
    use tempfile::TempDir;

    fn plan(steps: Vec<PlanStep>) -> DeployPlan {
        DeployPlan { steps }
    }

    #[test]
    fn steps_translate_to_git_invocations_in_order() {
        let tmp = TempDir::new().expect("tempdir");
        let exec = ScriptedExecutor::new();
        let platform = FakePlatform::default();
        let replicator = GitReplicator::new(&exec, tmp.path().to_path_buf());

        replicator
            .execute(
                &plan(vec![
                    PlanStep::CreateBranch("original".into()),
                    PlanStep::ResetToCommitsAgo(5),
                    PlanStep::ForcePush,
                    PlanStep::Deploy(EnvId::Live),
                    PlanStep::MergeBranch("original".into()),
                    PlanStep::Push,
                ]),
                &platform,
                &SiteName::from("dst"),
                "clone",
            )
            .expect("execute");

        assert_eq!(
            exec.calls(),
            vec![
                "git branch -f original",
                "git reset --hard HEAD~5",
                "git push origin master --force",
                "git merge original",
                "git push origin master",
            ]
        );
        assert_eq!(platform.log(), vec!["deploy dst.live note=clone"]);
    }

    #[test]
    fn failed_git_step_aborts_with_git_error() {
        let tmp = TempDir::new().expect("tempdir");
        let exec = ScriptedExecutor::new().fail_matching("push");
        let platform = FakePlatform::default();
        let replicator = GitReplicator::new(&exec, tmp.path().to_path_buf());

        let err = replicator
            .execute(
                &plan(vec![PlanStep::ForcePush, PlanStep::Deploy(EnvId::Test)]),
                &platform,
                &SiteName::from("dst"),
                "clone",
            )
            .expect_err("push fails");
        assert!(matches!(err, CloneError::Git { .. }));
        // The deploy after the failed push must never run.
        assert!(platform.log().is_empty());
    }

    #[test]
    fn failed_deploy_is_a_deploy_error() {
        let tmp = TempDir::new().expect("tempdir");
        let exec = ScriptedExecutor::new();
        let mut platform = FakePlatform::default();
        platform.failing_deploy = Some(EnvId::Live);
        let replicator = GitReplicator::new(&exec, tmp.path().to_path_buf());

        let err = replicator
            .execute(
                &plan(vec![PlanStep::Deploy(EnvId::Live)]),
                &platform,
                &SiteName::from("dst"),
                "clone",
            )
            .expect_err("deploy fails");
        assert!(matches!(err, CloneError::Deploy { env: EnvId::Live, .. }));
    }

    #[test]
    fn clone_or_pull_pulls_when_a_working_copy_exists() {
        let tmp = TempDir::new().expect("tempdir");
        let work = tmp.path().join("site");
        std::fs::create_dir_all(work.join(".git")).expect("mkdir");

        let exec = ScriptedExecutor::new();
        let replicator = GitReplicator::new(&exec, work);
        replicator
            .clone_or_pull("ssh://codeserver/site.git", Some(10))
            .expect("pull");

        assert_eq!(exec.calls(), vec!["git pull"]);
    }

    #[test]
    fn clone_or_pull_clones_fresh_with_depth() {
        let tmp = TempDir::new().expect("tempdir");
        let work = tmp.path().join("site");

        let exec = ScriptedExecutor::new();
        let replicator = GitReplicator::new(&exec, work.clone());
        replicator
            .clone_or_pull("ssh://codeserver/site.git", Some(10))
            .expect("clone");

        let calls = exec.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("git clone --depth=10 ssh://codeserver/site.git"));
        assert!(calls[0].ends_with(&work.to_string_lossy().to_string()));
    }

    #[test]
    fn prepare_points_the_work_branch_at_the_source_head() {
        let tmp = TempDir::new().expect("tempdir");
        let work = tmp.path().join("dst");
        std::fs::create_dir_all(work.join(".git")).expect("mkdir");

        let exec = ScriptedExecutor::new();
        let replicator = GitReplicator::new(&exec, work);
        replicator
            .prepare("ssh://codeserver/dst.git", None, "ssh://codeserver/src.git", Some(50))
            .expect("prepare");

        assert_eq!(
            exec.calls(),
            vec![
                "git pull",
                "git remote remove source",
                "git remote add source ssh://codeserver/src.git",
                "git fetch source master --depth=50",
                "git checkout -B master",
                "git reset --hard FETCH_HEAD",
            ]
        );
    }

    #[test]
    fn remove_work_tree_is_best_effort() {
        let tmp = TempDir::new().expect("tempdir");
        let work = tmp.path().join("gone");
        std::fs::create_dir_all(&work).expect("mkdir");

        let exec = ScriptedExecutor::new();
        let replicator = GitReplicator::new(&exec, work.clone());
        assert!(replicator.remove_work_tree());
        assert!(!work.exists());
        // Removing an already-absent tree is still a success.
        assert!(replicator.remove_work_tree());
    }
}
