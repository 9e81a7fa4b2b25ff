//! Process execution behind a narrow interface.
//!
//! The engine never concatenates shell strings; every external command is an
//! argv slice handed to a [`ProcessExecutor`], so planner/replicator logic is
//! testable without a real shell (see [`crate::fakes::ScriptedExecutor`]).

use std::path::Path;
use std::process::Command;

use crate::error::ExecError;

/// Captured outcome of one subprocess invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Exit status zero.
    pub success: bool,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ExecResult {
    /// First non-empty stdout line, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
    }
}

/// Runs one command to completion and captures its output.
pub trait ProcessExecutor: Send + Sync {
    /// Run `args[0]` with the remaining arguments, optionally in `cwd`.
    ///
    /// Returns `Err` only when the process cannot be launched at all; a
    /// non-zero exit is a successful `run` with `success == false`.
    fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<ExecResult, ExecError>;
}

/// Real executor over `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor {
    /// Echo each command line to stdout (`--debug-git`).
    pub verbose: bool,
}

impl ProcessExecutor for ShellExecutor {
    fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<ExecResult, ExecError> {
        let (program, rest) = args.split_first().ok_or(ExecError::EmptyCommand)?;

        if self.verbose {
            println!("$ {}", args.join(" "));
        }
        tracing::debug!("exec: {}", args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(rest);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        Ok(ExecResult {
            success: output.status.success(),
            stdout: lines(&output.stdout),
            stderr: lines(&output.stderr),
        })
    }
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_owned)
        .collect()
}
