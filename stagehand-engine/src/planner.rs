//! Commit-partition planner.
//!
//! Pure decision logic: given which environments exist and how many commits
//! sit undeployed in each, produce the ordered git/deploy actions that
//! reproduce the source's promotion boundaries on the target. First matching
//! rule wins:
//!
//! 1. Fully promoted (live exists, nothing pending anywhere)
//! 2. Promoted to test only (test exists, nothing pending in test)
//! 3. Pending commits exist (partition the linear history)
//! 4. Test does not exist (plain push, no boundaries to reproduce)
//!
//! An environment's rule can only fire when that environment is initialized;
//! undefined counts never satisfy a zero check.

use std::fmt;

use stagehand_core::{EnvId, Environment};

/// Branch name used to snapshot the full dev history before any destructive
/// reset, so it is always recoverable.
pub const SNAPSHOT_BRANCH: &str = "original";

/// One atomic git or deploy action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    CreateBranch(String),
    CheckoutBranch(String),
    /// Hard-reset the working branch back by `n` commits.
    ResetToCommitsAgo(u32),
    ForcePush,
    Push,
    MergeBranch(String),
    Deploy(EnvId),
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::CreateBranch(name) => write!(f, "branch {name}"),
            PlanStep::CheckoutBranch(name) => write!(f, "checkout {name}"),
            PlanStep::ResetToCommitsAgo(n) => write!(f, "reset --hard HEAD~{n}"),
            PlanStep::ForcePush => write!(f, "push --force"),
            PlanStep::Push => write!(f, "push"),
            PlanStep::MergeBranch(name) => write!(f, "merge {name}"),
            PlanStep::Deploy(env) => write!(f, "deploy {env}"),
        }
    }
}

/// Ordered steps that replicate the source's deployment state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeployPlan {
    pub steps: Vec<PlanStep>,
}

impl DeployPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when the plan rewrites history before restoring it.
    pub fn has_resets(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, PlanStep::ResetToCommitsAgo(_)))
    }
}

/// Planner input: initialization state and pending-commit counts, as observed
/// on the source. Counts are `None` when not applicable (uninitialized).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    pub test_init: bool,
    pub live_init: bool,
    pub test_deployable: Option<u32>,
    pub live_deployable: Option<u32>,
}

impl PipelineState {
    /// Build from a platform environment listing plus accounted commit
    /// counts.
    pub fn from_environments(
        envs: &[Environment],
        counts: &std::collections::BTreeMap<EnvId, u32>,
    ) -> Self {
        let initialized =
            |id: &EnvId| envs.iter().any(|e| &e.id == id && e.initialized);
        let test_init = initialized(&EnvId::Test);
        let live_init = initialized(&EnvId::Live);
        Self {
            test_init,
            live_init,
            test_deployable: test_init.then(|| counts.get(&EnvId::Test).copied().unwrap_or(0)),
            live_deployable: live_init.then(|| counts.get(&EnvId::Live).copied().unwrap_or(0)),
        }
    }
}

/// Decide the minimum-surprise plan for `state`.
///
/// A pure function: the same state always yields the same plan.
pub fn plan(state: &PipelineState) -> DeployPlan {
    // Rule 1: fully promoted — every environment at the same commit.
    if state.live_init
        && state.live_deployable == Some(0)
        && state.test_deployable == Some(0)
    {
        return DeployPlan {
            steps: vec![
                PlanStep::Push,
                PlanStep::Deploy(EnvId::Test),
                PlanStep::Deploy(EnvId::Live),
            ],
        };
    }

    // Rule 2: promoted to test only, regardless of live.
    if state.test_init && state.test_deployable == Some(0) {
        return DeployPlan {
            steps: vec![PlanStep::Push, PlanStep::Deploy(EnvId::Test)],
        };
    }

    // Rule 4 (checked here so rule 3 below can assume test exists): no test
    // environment means no boundary to reproduce.
    if !state.test_init {
        return DeployPlan {
            steps: vec![PlanStep::Push],
        };
    }

    // Rule 3: pending commits exist; partition the linear history.
    let test_pending = state.test_deployable.unwrap_or(0);
    let live_pending = if state.live_init {
        state.live_deployable.unwrap_or(0)
    } else {
        0
    };

    let mut steps = vec![PlanStep::CreateBranch(SNAPSHOT_BRANCH.to_owned())];

    if state.live_init && live_pending > 0 {
        // Live runs at the commit live_pending + test_pending back from dev.
        // Deploying to live promotes through test in the same job.
        steps.push(PlanStep::ResetToCommitsAgo(live_pending + test_pending));
        steps.push(PlanStep::ForcePush);
        steps.push(PlanStep::Deploy(EnvId::Live));
        steps.push(PlanStep::MergeBranch(SNAPSHOT_BRANCH.to_owned()));
    }

    if test_pending > 0 {
        steps.push(PlanStep::ResetToCommitsAgo(test_pending));
        steps.push(PlanStep::ForcePush);
        steps.push(PlanStep::Deploy(EnvId::Test));
        if state.live_init && live_pending == 0 {
            // Live is caught up to test's boundary.
            steps.push(PlanStep::Deploy(EnvId::Live));
        }
        steps.push(PlanStep::MergeBranch(SNAPSHOT_BRANCH.to_owned()));
        // Dev must end up reflecting the commits still pending in test.
        steps.push(PlanStep::Push);
    }

    DeployPlan { steps }
}
