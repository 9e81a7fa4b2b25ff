//! Clone pipeline entrypoint.
//!
//! Sequences validation → backups → site creation → code replication →
//! content replication → cleanup. Fully sequential: every remote workflow is
//! awaited before the next dependent step runs, and no remote resource is
//! rolled back on a fatal error — a partially-created target site is left
//! for operator inspection.

use stagehand_core::{
    Element, EnvId, Environment, HookArgs, RunContext, SiteName, TransformKind, TransformRegistry,
};
use stagehand_platform::{ConnectionMode, PlatformClient, PlatformError, ProcessExecutor};

use crate::accounting;
use crate::content::{self, EnvContentOutcome};
use crate::error::CloneError;
use crate::freshness::{self, BackupInventory};
use crate::planner::{self, DeployPlan, PipelineState};
use crate::replicator::GitReplicator;

/// What one clone run did; returned on success for reporting.
#[derive(Debug)]
pub struct CloneReport {
    pub target: SiteName,
    /// Backups created before replication: `(env, element)`, element `None`
    /// for a whole-environment backup.
    pub backups_created: Vec<(EnvId, Option<Element>)>,
    pub plan: DeployPlan,
    pub content: Vec<EnvContentOutcome>,
    pub work_dir_removed: bool,
}

/// Clone `ctx.source`'s pipeline into the newly created `ctx.target`.
///
/// This is the canonical entrypoint for `stagehand clone`.
pub fn clone_site(
    ctx: &RunContext,
    exec: &dyn ProcessExecutor,
    platform: &dyn PlatformClient,
    hooks: &TransformRegistry,
) -> Result<CloneReport, CloneError> {
    // Validation and prerequisites, before any mutation anywhere.
    if ctx.target == ctx.source {
        return Err(CloneError::Validation(format!(
            "target site name '{}' must differ from the source",
            ctx.target
        )));
    }
    ensure_git(exec)?;
    platform.preflight().map_err(|e| match e {
        PlatformError::MissingBinary(bin) => {
            CloneError::Prerequisite(format!("'{bin}' is not available on PATH"))
        }
        other => other.into(),
    })?;

    let source_envs = platform.environments(&ctx.source)?;
    let initialized: Vec<EnvId> = source_envs
        .iter()
        .filter(|e| e.initialized && e.id.is_pipeline())
        .map(|e| e.id.clone())
        .collect();
    if !initialized.contains(&EnvId::Dev) {
        return Err(CloneError::Validation(format!(
            "source site '{}' has no initialized dev environment",
            ctx.source
        )));
    }

    let backups_created = ensure_backups(ctx, platform, &source_envs, &initialized)?;

    tracing::info!("creating target site '{}'", ctx.target);
    platform
        .create_site(&ctx.target, ctx.org.as_deref(), ctx.upstream.as_deref())?
        .await_completion()?;

    let (plan, replicator) = replicate_code(ctx, exec, platform, hooks, &source_envs)?;

    let outcomes = content::replicate_content(ctx, platform, hooks, &source_envs)?;

    let work_dir_removed = if ctx.debug_git {
        tracing::info!("debug mode: preserving {}", replicator.work_dir().display());
        false
    } else {
        replicator.remove_work_tree()
    };

    Ok(CloneReport {
        target: ctx.target.clone(),
        backups_created,
        plan,
        content: outcomes,
        work_dir_removed,
    })
}

fn ensure_git(exec: &dyn ProcessExecutor) -> Result<(), CloneError> {
    let argv = vec!["git".to_owned(), "--version".to_owned()];
    match exec.run(&argv, None) {
        Ok(result) if result.success => Ok(()),
        _ => Err(CloneError::Prerequisite(
            "'git' is not available on PATH".to_owned(),
        )),
    }
}

/// Make sure trustworthy backups exist before replication starts.
///
/// With `--source-site-backup` every initialized environment is backed up
/// unconditionally; otherwise the audit runs and only missing/stale
/// (environment, element) slots get a fresh backup.
fn ensure_backups(
    ctx: &RunContext,
    platform: &dyn PlatformClient,
    source_envs: &[Environment],
    initialized: &[EnvId],
) -> Result<Vec<(EnvId, Option<Element>)>, CloneError> {
    let mut created = Vec::new();

    if ctx.force_backups {
        for env in initialized {
            tracing::info!("backing up {}.{env} (forced refresh)", ctx.source);
            start_backup(ctx, platform, env, None)?;
            created.push((env.clone(), None));
        }
        return Ok(created);
    }

    let mut inventory = BackupInventory::new();
    for env in source_envs.iter().filter(|e| e.initialized) {
        if !initialized.contains(&env.id) {
            continue;
        }
        let by_element = inventory.entry(env.id.clone()).or_default();
        for element in Element::all() {
            by_element.insert(element, platform.backups(&ctx.source, &env.id, element)?);
        }
    }

    let audit = freshness::validate(&inventory, initialized, ctx.started_at);
    for (env, element) in audit.needs_backup() {
        tracing::info!("backing up {}.{env} {element} (missing or stale)", ctx.source);
        start_backup(ctx, platform, &env, Some(element))?;
        created.push((env, Some(element)));
    }

    Ok(created)
}

fn start_backup(
    ctx: &RunContext,
    platform: &dyn PlatformClient,
    env: &EnvId,
    element: Option<Element>,
) -> Result<(), CloneError> {
    let workflow = platform
        .create_backup(&ctx.source, env, element)
        .map_err(|source| backup_err(env, element, source))?;
    workflow
        .await_completion()
        .map_err(|source| backup_err(env, element, source))
}

fn backup_err(env: &EnvId, element: Option<Element>, source: PlatformError) -> CloneError {
    CloneError::Backup {
        env: env.clone(),
        scope: element.map_or_else(|| "all".to_owned(), |e| e.to_string()),
        source,
    }
}

/// Account, plan, and execute the git history replication, then run code
/// transform hooks against the working clone.
fn replicate_code<'e>(
    ctx: &RunContext,
    exec: &'e dyn ProcessExecutor,
    platform: &dyn PlatformClient,
    hooks: &TransformRegistry,
    source_envs: &[Environment],
) -> Result<(DeployPlan, GitReplicator<'e>), CloneError> {
    let counts = accounting::deployable_commits(platform, &ctx.source, source_envs)?;
    let state = PipelineState::from_environments(source_envs, &counts);
    let plan = planner::plan(&state);
    for step in &plan.steps {
        tracing::debug!("planned: {step}");
    }

    platform
        .set_connection_mode(&ctx.target, &EnvId::Dev, ConnectionMode::Git)?
        .await_completion()?;

    let source_url = platform.git_remote_url(&ctx.source, &EnvId::Dev)?;
    let target_url = platform.git_remote_url(&ctx.target, &EnvId::Dev)?;

    let replicator = GitReplicator::new(exec, ctx.work_dir(&ctx.target));
    replicator.prepare(
        &target_url,
        ctx.target_git_depth,
        &source_url,
        ctx.source_git_depth,
    )?;

    let note = format!("Cloned from site '{}'", ctx.source);
    replicator.execute(&plan, platform, &ctx.target, &note)?;

    hooks.run(
        TransformKind::TransformCode,
        &ctx.skip_hooks,
        &HookArgs {
            target: &ctx.target,
            env: None,
            work_dir: Some(replicator.work_dir()),
        },
    )?;

    Ok((plan, replicator))
}
