//! Content replication driver.
//!
//! Environments are processed strictly in pipeline order (dev, test, live;
//! multidev excluded) and one at a time: an environment's content transforms
//! run after its imports and before the next environment begins, so later
//! environments never see partially-imported state mixed in.
//!
//! Import failures follow the best-effort policy: the environment's content
//! step is recorded as failed and replication continues with the next
//! environment. Hook and cache-clear failures stay fatal.

use stagehand_core::{
    Element, EnvId, Environment, HookArgs, RunContext, TransformKind, TransformRegistry,
};
use stagehand_platform::PlatformClient;

use crate::error::CloneError;

/// Outcome of one environment's content replication.
#[derive(Debug)]
pub struct EnvContentOutcome {
    pub env: EnvId,
    pub status: ContentStatus,
}

#[derive(Debug)]
pub enum ContentStatus {
    /// Imports, hooks, and cache clear all completed.
    Replicated { hooks_run: Vec<String> },
    /// The environment's content step was skipped; `reason` says why.
    Failed { reason: String },
}

impl ContentStatus {
    pub fn is_replicated(&self) -> bool {
        matches!(self, ContentStatus::Replicated { .. })
    }
}

/// Replicate database and files content for every initialized pipeline
/// environment of the source, in order.
pub fn replicate_content(
    ctx: &RunContext,
    platform: &dyn PlatformClient,
    hooks: &TransformRegistry,
    source_envs: &[Environment],
) -> Result<Vec<EnvContentOutcome>, CloneError> {
    let mut outcomes = Vec::new();

    for env in EnvId::pipeline() {
        let initialized = source_envs
            .iter()
            .any(|e| e.id == env && e.initialized);
        if !initialized {
            continue;
        }

        let status = replicate_env(ctx, platform, hooks, &env)?;
        outcomes.push(EnvContentOutcome { env, status });
    }

    Ok(outcomes)
}

fn replicate_env(
    ctx: &RunContext,
    platform: &dyn PlatformClient,
    hooks: &TransformRegistry,
    env: &EnvId,
) -> Result<ContentStatus, CloneError> {
    // Resolve every element URL before importing anything, so a missing
    // backup fails the environment without a half-done import.
    let mut resolved: Vec<(Element, String)> = Vec::new();
    for element in Element::content() {
        match platform.backup_url(&ctx.source, env, element)? {
            Some(url) => resolved.push((element, url)),
            None => {
                let reason = format!("no {element} backup URL for {}.{env}", ctx.source);
                tracing::warn!("{reason}; skipping environment content");
                return Ok(ContentStatus::Failed { reason });
            }
        }
    }

    for (element, url) in &resolved {
        let imported = platform.import_content(&ctx.target, env, *element, url)?;
        if !imported {
            let err = CloneError::ContentImport {
                env: env.clone(),
                element: *element,
                detail: "import sub-invocation exited non-zero".to_owned(),
            };
            tracing::warn!("{err}; skipping environment content");
            return Ok(ContentStatus::Failed {
                reason: err.to_string(),
            });
        }
        tracing::info!("imported {element} into {}.{env}", ctx.target);
    }

    let hooks_run = hooks.run(
        TransformKind::TransformContent,
        &ctx.skip_hooks,
        &HookArgs {
            target: &ctx.target,
            env: Some(env),
            work_dir: None,
        },
    )?;

    platform.clear_cache(&ctx.target, env)?.await_completion()?;

    Ok(ContentStatus::Replicated { hooks_run })
}
