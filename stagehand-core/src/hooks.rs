//! Transform hook registry.
//!
//! Extra code/content transforms are registered by name at program wiring
//! time, never discovered by runtime introspection. Hooks of a kind run in
//! lexicographic name order (a `BTreeMap` gives this by construction), minus
//! whatever names the run's skip-set excludes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::CoreError;
use crate::types::{EnvId, SiteName};

/// Which stage of replication a hook attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// After code replication completes for the target.
    TransformCode,
    /// After each environment's content import, before its cache clear.
    TransformContent,
}

/// What a hook gets to see when invoked.
#[derive(Debug)]
pub struct HookArgs<'a> {
    pub target: &'a SiteName,
    /// The environment being transformed; `None` for code transforms.
    pub env: Option<&'a EnvId>,
    /// The working clone, when one exists at invocation time.
    pub work_dir: Option<&'a Path>,
}

type HookFn = Box<dyn Fn(&HookArgs<'_>) -> Result<(), CoreError> + Send + Sync>;

/// Ordered, named transform hooks for one run.
#[derive(Default)]
pub struct TransformRegistry {
    code: BTreeMap<String, HookFn>,
    content: BTreeMap<String, HookFn>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under `kind`. A later registration with the same name
    /// replaces the earlier one.
    pub fn register<F>(&mut self, kind: TransformKind, name: &str, hook: F)
    where
        F: Fn(&HookArgs<'_>) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        self.map_mut(kind).insert(name.to_owned(), Box::new(hook));
    }

    /// Registered hook names for `kind`, in invocation order.
    pub fn names(&self, kind: TransformKind) -> Vec<String> {
        self.map(kind).keys().cloned().collect()
    }

    /// Invoke every hook of `kind` not named in `skip`, in lexicographic
    /// order. Returns the names actually run; the first hook error aborts.
    pub fn run(
        &self,
        kind: TransformKind,
        skip: &BTreeSet<String>,
        args: &HookArgs<'_>,
    ) -> Result<Vec<String>, CoreError> {
        let mut ran = Vec::new();
        for (name, hook) in self.map(kind) {
            if skip.contains(name) {
                continue;
            }
            hook(args)?;
            ran.push(name.clone());
        }
        Ok(ran)
    }

    fn map(&self, kind: TransformKind) -> &BTreeMap<String, HookFn> {
        match kind {
            TransformKind::TransformCode => &self.code,
            TransformKind::TransformContent => &self.content,
        }
    }

    fn map_mut(&mut self, kind: TransformKind) -> &mut BTreeMap<String, HookFn> {
        match kind {
            TransformKind::TransformCode => &mut self.code,
            TransformKind::TransformContent => &mut self.content,
        }
    }
}
