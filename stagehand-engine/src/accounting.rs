//! Deployable-commit accounting.
//!
//! The engine never computes diffs itself; it consumes the platform's own
//! commit-comparison facility, one integer per environment. Only initialized
//! test/live carry a meaningful count — dev and multidev are skipped.

use std::collections::BTreeMap;

use stagehand_core::{EnvId, Environment, SiteName};
use stagehand_platform::PlatformClient;

use crate::error::CloneError;

/// Commits pending deployment per environment, restricted to initialized
/// test/live.
pub fn deployable_commits(
    platform: &dyn PlatformClient,
    site: &SiteName,
    environments: &[Environment],
) -> Result<BTreeMap<EnvId, u32>, CloneError> {
    let mut counts = BTreeMap::new();
    for env in environments {
        if !env.initialized || !matches!(env.id, EnvId::Test | EnvId::Live) {
            continue;
        }
        let count = platform.deployable_commits(site, &env.id)?;
        tracing::debug!("{site}.{}: {count} deployable commit(s)", env.id);
        counts.insert(env.id.clone(), count);
    }
    Ok(counts)
}
