//! `terminus`-backed platform client.
//!
//! Shells out to the platform's own CLI through the [`ProcessExecutor`] and
//! parses its `--format=json` output. The CLI blocks until each remote
//! workflow finishes, so every workflow-returning operation hands back an
//! already-resolved outcome.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use stagehand_core::{Backup, Element, EnvId, Environment, SiteName};

use crate::api::{ConnectionMode, PlatformClient, Resolved, Workflow};
use crate::error::{ExecError, PlatformError};
use crate::exec::{ExecResult, ProcessExecutor};

const BIN: &str = "terminus";

/// Platform client over the `terminus` binary.
pub struct TerminusClient<'e> {
    exec: &'e dyn ProcessExecutor,
}

impl<'e> TerminusClient<'e> {
    pub fn new(exec: &'e dyn ProcessExecutor) -> Self {
        Self { exec }
    }

    fn invoke(&self, args: &[String]) -> Result<ExecResult, PlatformError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(BIN.to_owned());
        argv.extend(args.iter().cloned());
        Ok(self.exec.run(&argv, None)?)
    }

    /// Run a terminus subcommand, treating non-zero exit as an error.
    fn run(&self, args: &[&str]) -> Result<ExecResult, PlatformError> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let result = self.invoke(&owned)?;
        if !result.success {
            return Err(PlatformError::Command {
                command: format!("{BIN} {}", args.join(" ")),
                detail: result.stderr.join("\n"),
            });
        }
        Ok(result)
    }

    fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, PlatformError> {
        let result = self.run(args)?;
        let body = result.stdout.join("\n");
        serde_json::from_str(&body).map_err(|e| PlatformError::Parse {
            command: format!("{BIN} {}", args.join(" ")),
            detail: e.to_string(),
        })
    }

    /// Run a terminus subcommand whose remote job the CLI already waited on.
    fn workflow(&self, args: &[&str]) -> Box<dyn Workflow> {
        Resolved::new(self.run(args).map(|_| ()))
    }

    fn field(&self, args: &[&str]) -> Result<Option<String>, PlatformError> {
        let result = self.run(args)?;
        Ok(result.first_line().map(str::to_owned))
    }
}

fn site_env(site: &SiteName, env: &EnvId) -> String {
    format!("{site}.{env}")
}

/// Environment record as `env:list --format=json` emits it. The platform is
/// loose about boolean encoding, so `initialized` is interpreted permissively.
#[derive(Debug, Deserialize)]
struct RawEnv {
    #[serde(default)]
    initialized: serde_json::Value,
}

fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s == "true" || s == "1",
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

/// Backup record as `backup:list --format=json` emits it.
#[derive(Debug, Deserialize)]
struct RawBackup {
    /// Completion time, unix epoch seconds.
    finish_time: f64,
    #[serde(default)]
    url: Option<String>,
}

fn epoch_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs as i64, 0)
}

impl PlatformClient for TerminusClient<'_> {
    fn preflight(&self) -> Result<(), PlatformError> {
        let argv = vec![BIN.to_owned(), "--version".to_owned()];
        match self.exec.run(&argv, None) {
            Ok(result) if result.success => Ok(()),
            Ok(_) | Err(ExecError::Spawn { .. }) => Err(PlatformError::MissingBinary(BIN)),
            Err(e) => Err(e.into()),
        }
    }

    fn create_site(
        &self,
        site: &SiteName,
        org: Option<&str>,
        upstream: Option<&str>,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        let mut args = vec!["site:create", &site.0];
        if let Some(org) = org {
            args.push("--org");
            args.push(org);
        }
        if let Some(upstream) = upstream {
            args.push("--upstream");
            args.push(upstream);
        }
        Ok(self.workflow(&args))
    }

    fn environments(&self, site: &SiteName) -> Result<Vec<Environment>, PlatformError> {
        let raw: BTreeMap<String, RawEnv> =
            self.run_json(&["env:list", &site.0, "--format=json"])?;
        Ok(raw
            .into_iter()
            .map(|(id, env)| Environment {
                id: EnvId::from(id),
                initialized: truthy(&env.initialized),
                deployable_commits: None,
            })
            .collect())
    }

    fn git_remote_url(&self, site: &SiteName, env: &EnvId) -> Result<String, PlatformError> {
        let se = site_env(site, env);
        let args = ["connection:info", se.as_str(), "--field=git_url"];
        self.field(&args)?.ok_or_else(|| PlatformError::Parse {
            command: format!("{BIN} {}", args.join(" ")),
            detail: "empty git_url".to_owned(),
        })
    }

    fn set_connection_mode(
        &self,
        site: &SiteName,
        env: &EnvId,
        mode: ConnectionMode,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        let se = site_env(site, env);
        let mode = mode.to_string();
        Ok(self.workflow(&["connection:set", &se, &mode]))
    }

    fn deployable_commits(&self, site: &SiteName, env: &EnvId) -> Result<u32, PlatformError> {
        let se = site_env(site, env);
        let args = ["env:info", se.as_str(), "--field=deployable-commits"];
        let line = self.field(&args)?.unwrap_or_default();
        line.parse().map_err(|_| PlatformError::Parse {
            command: format!("{BIN} {}", args.join(" ")),
            detail: format!("expected a commit count, got '{line}'"),
        })
    }

    fn backups(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
    ) -> Result<Vec<Backup>, PlatformError> {
        let se = site_env(site, env);
        let element_arg = format!("--element={element}");
        let args = ["backup:list", se.as_str(), &element_arg, "--format=json"];
        let raw: Vec<RawBackup> = self.run_json(&args)?;
        Ok(raw
            .into_iter()
            .filter_map(|b| {
                epoch_to_datetime(b.finish_time).map(|finish_time| Backup {
                    env: env.clone(),
                    element,
                    finish_time,
                    url: b.url,
                })
            })
            .collect())
    }

    fn backup_url(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
    ) -> Result<Option<String>, PlatformError> {
        let se = site_env(site, env);
        let element_arg = format!("--element={element}");
        self.field(&["backup:get", &se, &element_arg])
    }

    fn create_backup(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Option<Element>,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        let se = site_env(site, env);
        let mut args = vec!["backup:create", se.as_str()];
        let element_arg = element.map(|e| format!("--element={e}"));
        if let Some(arg) = element_arg.as_deref() {
            args.push(arg);
        }
        Ok(self.workflow(&args))
    }

    fn import_content(
        &self,
        site: &SiteName,
        env: &EnvId,
        element: Element,
        url: &str,
    ) -> Result<bool, PlatformError> {
        let subcommand = match element {
            Element::Database => "import:database",
            Element::Files => "import:files",
            Element::Code => return Err(PlatformError::UnsupportedElement(element)),
        };
        let se = site_env(site, env);
        let args = vec![
            subcommand.to_owned(),
            se,
            url.to_owned(),
            "--yes".to_owned(),
        ];
        let result = self.invoke(&args)?;
        Ok(result.success)
    }

    fn clear_cache(
        &self,
        site: &SiteName,
        env: &EnvId,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        let se = site_env(site, env);
        Ok(self.workflow(&["env:clear-cache", &se]))
    }

    fn deploy(
        &self,
        site: &SiteName,
        env: &EnvId,
        note: &str,
    ) -> Result<Box<dyn Workflow>, PlatformError> {
        let se = site_env(site, env);
        Ok(self.workflow(&["env:deploy", &se, "--note", note]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecResult;
    use crate::fakes::ScriptedExecutor;

    fn ok_with(stdout: &[&str]) -> ExecResult {
        ExecResult {
            success: true,
            stdout: stdout.iter().map(|s| s.to_string()).collect(),
            stderr: vec![],
        }
    }

    #[test]
    fn environments_parses_loose_initialized_flags() {
        let exec = ScriptedExecutor::new().respond(
            "env:list",
            ok_with(&[r#"{
                "dev": {"initialized": true},
                "test": {"initialized": "true"},
                "live": {"initialized": "false"},
                "feature-x": {"initialized": 1}
            }"#]),
        );
        let client = TerminusClient::new(&exec);
        let mut envs = client
            .environments(&SiteName::from("demo"))
            .expect("environments");
        envs.sort_by_key(|e| e.id.to_string());

        let by_id = |id: &str| {
            envs.iter()
                .find(|e| e.id == EnvId::from(id))
                .expect("env present")
        };
        assert!(by_id("dev").initialized);
        assert!(by_id("test").initialized);
        assert!(!by_id("live").initialized);
        assert!(by_id("feature-x").initialized);
        assert_eq!(by_id("feature-x").id, EnvId::Multidev("feature-x".into()));
    }

    #[test]
    fn deployable_commits_parses_the_count() {
        let exec = ScriptedExecutor::new().respond("env:info", ok_with(&["4"]));
        let client = TerminusClient::new(&exec);
        let count = client
            .deployable_commits(&SiteName::from("demo"), &EnvId::Test)
            .expect("count");
        assert_eq!(count, 4);
        assert!(exec
            .calls()
            .iter()
            .any(|c| c.contains("env:info demo.test")));
    }

    #[test]
    fn deployable_commits_rejects_garbage() {
        let exec = ScriptedExecutor::new().respond("env:info", ok_with(&["not-a-number"]));
        let client = TerminusClient::new(&exec);
        let err = client
            .deployable_commits(&SiteName::from("demo"), &EnvId::Live)
            .expect_err("parse failure");
        assert!(matches!(err, PlatformError::Parse { .. }));
    }

    #[test]
    fn backups_converts_epoch_finish_times() {
        let exec = ScriptedExecutor::new().respond(
            "backup:list",
            ok_with(&[r#"[
                {"finish_time": 1700000000, "url": "https://backups/one.tgz"},
                {"finish_time": 1700003600}
            ]"#]),
        );
        let client = TerminusClient::new(&exec);
        let backups = client
            .backups(&SiteName::from("demo"), &EnvId::Dev, Element::Database)
            .expect("backups");
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].element, Element::Database);
        assert_eq!(backups[0].url.as_deref(), Some("https://backups/one.tgz"));
        assert_eq!(backups[0].finish_time.timestamp(), 1_700_000_000);
        assert!(backups[1].url.is_none());
    }

    #[test]
    fn command_failure_surfaces_stderr() {
        let exec = ScriptedExecutor::new().respond(
            "env:list",
            ExecResult {
                success: false,
                stdout: vec![],
                stderr: vec!["site not found".into()],
            },
        );
        let client = TerminusClient::new(&exec);
        let err = client
            .environments(&SiteName::from("ghost"))
            .expect_err("failure");
        assert!(err.to_string().contains("site not found"));
    }

    #[test]
    fn import_content_reports_exit_code_semantics() {
        let exec = ScriptedExecutor::new().fail_matching("import:files");
        let client = TerminusClient::new(&exec);
        let ok = client
            .import_content(
                &SiteName::from("demo"),
                &EnvId::Test,
                Element::Database,
                "https://backups/db.tgz",
            )
            .expect("import");
        assert!(ok);

        let failed = client
            .import_content(
                &SiteName::from("demo"),
                &EnvId::Test,
                Element::Files,
                "https://backups/files.tgz",
            )
            .expect("import runs");
        assert!(!failed);

        let code = client.import_content(
            &SiteName::from("demo"),
            &EnvId::Test,
            Element::Code,
            "https://backups/code.tgz",
        );
        assert!(matches!(code, Err(PlatformError::UnsupportedElement(_))));
    }

    #[test]
    fn create_backup_scopes_to_an_element() {
        let exec = ScriptedExecutor::new();
        let client = TerminusClient::new(&exec);
        client
            .create_backup(&SiteName::from("demo"), &EnvId::Test, Some(Element::Database))
            .expect("start")
            .await_completion()
            .expect("complete");
        client
            .create_backup(&SiteName::from("demo"), &EnvId::Dev, None)
            .expect("start")
            .await_completion()
            .expect("complete");

        let calls = exec.calls();
        assert!(calls
            .iter()
            .any(|c| c.contains("backup:create demo.test --element=database")));
        assert!(calls
            .iter()
            .any(|c| c.ends_with("backup:create demo.dev")));
    }
}
