//! `stagehand clone` — replicate a source site's pipeline onto a new site.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use stagehand_core::{RunContext, SiteName, TransformRegistry};
use stagehand_engine::{clone_site, CloneReport, ContentStatus};
use stagehand_platform::{ShellExecutor, TerminusClient};

/// Arguments for `stagehand clone`.
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Site to clone from.
    #[arg(long, value_name = "SITE")]
    pub source_site: String,

    /// Name of the site to create (alternative to prefix/suffix).
    #[arg(
        long,
        value_name = "SITE",
        conflicts_with_all = ["target_site_prefix", "target_site_suffix"]
    )]
    pub target_site: Option<String>,

    /// Prepended to the source name to form the target name.
    #[arg(long, value_name = "PREFIX")]
    pub target_site_prefix: Option<String>,

    /// Appended to the source name to form the target name.
    #[arg(long, value_name = "SUFFIX")]
    pub target_site_suffix: Option<String>,

    /// Organization to create the target site under.
    #[arg(long, value_name = "ORG")]
    pub target_site_org: Option<String>,

    /// Upstream to create the target site from.
    #[arg(long, value_name = "UPSTREAM")]
    pub target_site_upstream: Option<String>,

    /// Shallow-fetch depth for the source repository.
    #[arg(long, value_name = "N")]
    pub source_site_git_depth: Option<u32>,

    /// Shallow-clone depth for the target repository.
    #[arg(long, value_name = "N")]
    pub target_site_git_depth: Option<u32>,

    /// Take fresh backups of every initialized source environment instead of
    /// auditing the existing ones.
    #[arg(long)]
    pub source_site_backup: bool,

    /// Comma-separated names of transform hooks to skip this run.
    #[arg(long = "no-custom", value_name = "NAMES", value_delimiter = ',')]
    pub no_custom: Vec<String>,

    /// Echo every git command and keep the working clone afterwards.
    #[arg(long)]
    pub debug_git: bool,
}

impl CloneArgs {
    pub fn run(self) -> Result<()> {
        let source = SiteName::parse(&self.source_site)?;
        let target = resolve_target(
            self.target_site.as_deref(),
            self.target_site_prefix.as_deref(),
            self.target_site_suffix.as_deref(),
            &source,
        )?;
        if target == source {
            bail!("target site '{target}' must differ from the source site");
        }

        let work_root = dirs::home_dir()
            .context("could not determine home directory")?
            .join(".stagehand")
            .join("work");

        let ctx = RunContext {
            source: source.clone(),
            target: target.clone(),
            org: self.target_site_org,
            upstream: self.target_site_upstream,
            source_git_depth: self.source_site_git_depth,
            target_git_depth: self.target_site_git_depth,
            force_backups: self.source_site_backup,
            skip_hooks: self.no_custom.into_iter().collect(),
            debug_git: self.debug_git,
            started_at: Utc::now(),
            work_root,
        };

        let exec = ShellExecutor {
            verbose: ctx.debug_git,
        };
        let platform = TerminusClient::new(&exec);
        let hooks = TransformRegistry::new();

        println!("Cloning '{source}' into '{target}' ...");
        let report = clone_site(&ctx, &exec, &platform, &hooks)
            .with_context(|| format!("clone of '{source}' into '{target}' failed"))?;
        print_report(&report);
        Ok(())
    }
}

/// Resolve the target site name from `--target-site` or the
/// prefix/suffix pair.
fn resolve_target(
    target: Option<&str>,
    prefix: Option<&str>,
    suffix: Option<&str>,
    source: &SiteName,
) -> Result<SiteName> {
    if let Some(name) = target {
        return Ok(SiteName::parse(name)?);
    }
    if prefix.is_none() && suffix.is_none() {
        bail!(
            "provide --target-site, or --target-site-prefix/--target-site-suffix \
             to derive the target name from the source"
        );
    }
    let derived = format!(
        "{}{}{}",
        prefix.unwrap_or_default(),
        source,
        suffix.unwrap_or_default()
    );
    Ok(SiteName::parse(&derived)?)
}

fn print_report(report: &CloneReport) {
    println!(
        "{} pipeline of cloned site is live on '{}'",
        "✓".green(),
        report.target
    );

    if !report.backups_created.is_empty() {
        println!("  fresh backups taken before replication:");
        for (env, element) in &report.backups_created {
            match element {
                Some(el) => println!("    {env} {el}"),
                None => println!("    {env} (all elements)"),
            }
        }
    }

    println!("  code replication plan executed:");
    for step in &report.plan.steps {
        println!("    {step}");
    }

    for outcome in &report.content {
        match &outcome.status {
            ContentStatus::Replicated { hooks_run } if hooks_run.is_empty() => {
                println!("  {} content replicated to {}", "·".green(), outcome.env);
            }
            ContentStatus::Replicated { hooks_run } => {
                println!(
                    "  {} content replicated to {} (hooks: {})",
                    "·".green(),
                    outcome.env,
                    hooks_run.join(", ")
                );
            }
            ContentStatus::Failed { reason } => {
                println!(
                    "  {} content skipped for {}: {reason}",
                    "!".yellow(),
                    outcome.env
                );
            }
        }
    }

    if !report.work_dir_removed {
        println!("  {} working clone preserved for inspection", "~".yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_target_wins() {
        let source = SiteName::from("alpha");
        let t = resolve_target(Some("beta"), None, None, &source).expect("target");
        assert_eq!(t, SiteName::from("beta"));
    }

    #[test]
    fn prefix_and_suffix_derive_the_target() {
        let source = SiteName::from("alpha");
        let t = resolve_target(None, Some("qa-"), Some("-2"), &source).expect("target");
        assert_eq!(t, SiteName::from("qa-alpha-2"));

        let t = resolve_target(None, None, Some("-copy"), &source).expect("target");
        assert_eq!(t, SiteName::from("alpha-copy"));
    }

    #[test]
    fn missing_target_and_affixes_is_an_error() {
        let source = SiteName::from("alpha");
        let err = resolve_target(None, None, None, &source).expect_err("no target");
        assert!(err.to_string().contains("--target-site"));
    }

    #[test]
    fn derived_names_are_still_validated() {
        // An affix with whitespace yields an invalid site name.
        let source = SiteName::from("alpha");
        assert!(resolve_target(None, Some("bad prefix "), None, &source).is_err());
    }
}
