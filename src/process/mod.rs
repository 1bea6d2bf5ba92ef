//! External process invocation.
//!
//! Every command the pipeline runs inside a distribution (pip, the test suite) goes
//! through a [`CommandRunner`], so tests can swap in a mock and nothing is spawned.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Exit information of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, inheriting stdout and stderr, and wait for it.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandStatus>;
}

/// Runs commands with `tokio::process`, optionally bounded by a timeout.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {
    timeout: Option<Duration>,
}

impl TokioCommandRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    #[tracing::instrument(skip(self))]
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandStatus> {
        debug!("Running {} {:?}", program, args);

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", program))?;

        let status = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait())
                .await
                .map_err(|_| anyhow!("{} did not finish within {:?}", program, limit))?,
            None => child.wait().await,
        }
        .with_context(|| format!("Failed to wait for {}", program))?;

        Ok(CommandStatus {
            code: status.code(),
        })
    }
}

/// How to start a command inside a distribution's environment.
///
/// The resulting invocation is `<shell...> <root>\<prompt> <words...>`, which on
/// Windows is `cmd.exe /C "<root>\WinPython Command Prompt.exe" pip ...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Launcher {
    pub shell: Vec<String>,
    pub prompt: String,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            shell: vec!["cmd.exe".to_string(), "/C".to_string()],
            prompt: "WinPython Command Prompt.exe".to_string(),
        }
    }
}

impl Launcher {
    /// Split an invocation into program and arguments.
    pub fn invocation(&self, dist_root: &Path, words: &[&str]) -> (String, Vec<String>) {
        let prompt = dist_root.join(&self.prompt).display().to_string();

        let mut parts: Vec<String> = self.shell.clone();
        parts.push(prompt);
        parts.extend(words.iter().map(|w| w.to_string()));

        let program = parts.remove(0);
        (program, parts)
    }

    /// Run `words` inside the distribution rooted at `dist_root`.
    ///
    /// The exit status is returned for logging; it is never turned into an error.
    pub async fn run<C: CommandRunner + ?Sized>(
        &self,
        runner: &C,
        dist_root: &Path,
        words: &[&str],
    ) -> Result<CommandStatus> {
        let (program, args) = self.invocation(dist_root, words);
        let status = runner.run(&program, &args).await?;
        info!("{} {} finished with {}", program, args.join(" "), status);
        Ok(status)
    }
}
