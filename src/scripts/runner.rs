//! Script execution
//!
//! Scripts run under `bash` (or `sh` when bash is missing) in their own
//! process group, with stdout/stderr inherited so users see their output.
//! The runner polls the child so it can react to a timeout or a Ctrl-C; on
//! either the whole group gets SIGTERM, then SIGKILL after a grace period.

use anyhow::{bail, Context, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

use super::cancel::CancelToken;
use super::env::ScriptContext;
use crate::error::RampError;

/// How often the child is checked for exit, timeout and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time between SIGTERM and SIGKILL
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptKind {
    Setup,
    Cleanup,
    Command(String),
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Setup => write!(f, "setup"),
            ScriptKind::Cleanup => write!(f, "cleanup"),
            ScriptKind::Command(name) => write!(f, "command '{name}'"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl ScriptRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            cancel: None,
        }
    }

    /// Make running scripts cancellable through `token`
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fail with [`RampError::Cancelled`] if the token has already fired.
    ///
    /// Lets callers stop between steps that run no script.
    pub fn check_cancelled(&self) -> Result<(), RampError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(RampError::Cancelled);
        }
        Ok(())
    }

    /// Run `script` to completion with the environment from `ctx`.
    ///
    /// Fails with [`RampError::ScriptFailed`] on a nonzero exit,
    /// [`RampError::ScriptTimedOut`] past the timeout and
    /// [`RampError::Cancelled`] when the token fires.
    pub fn run(&self, kind: &ScriptKind, script: &Path, ctx: &ScriptContext) -> Result<()> {
        if !script.is_file() {
            bail!("{kind} script not found: {}", script.display());
        }

        let working_dir = ctx.working_dir();
        tracing::info!(
            %kind,
            script = %script.display(),
            dir = %working_dir.display(),
            "running script"
        );

        let mut child = spawn_script(script, working_dir, ctx)
            .with_context(|| format!("Failed to start {kind} script: {}", script.display()))?;
        let status = self.wait(&mut child, kind, script)?;

        if status.success() {
            return Ok(());
        }
        Err(RampError::ScriptFailed {
            kind: kind.to_string(),
            script: script.display().to_string(),
            code: status.code(),
        }
        .into())
    }

    fn wait(&self, child: &mut Child, kind: &ScriptKind, script: &Path) -> Result<ExitStatus> {
        let started = Instant::now();
        loop {
            if let Some(status) = child
                .wait_timeout(POLL_INTERVAL)
                .with_context(|| format!("Failed to wait for {kind} script"))?
            {
                return Ok(status);
            }

            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                tracing::warn!(%kind, "cancelled, terminating script");
                terminate_group(child);
                return Err(RampError::Cancelled.into());
            }

            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    tracing::warn!(%kind, secs = timeout.as_secs(), "script timed out");
                    terminate_group(child);
                    return Err(RampError::ScriptTimedOut {
                        kind: kind.to_string(),
                        script: script.display().to_string(),
                        secs: timeout.as_secs(),
                    }
                    .into());
                }
            }
        }
    }
}

/// `bash` when available, else `sh`
fn shell() -> PathBuf {
    which::which("bash").unwrap_or_else(|_| PathBuf::from("sh"))
}

fn spawn_script(script: &Path, working_dir: &Path, ctx: &ScriptContext) -> Result<Child> {
    let mut cmd = Command::new(shell());
    cmd.arg(script)
        .current_dir(working_dir)
        .envs(ctx.env_vars())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .process_group(0);
    Ok(cmd.spawn()?)
}

/// SIGTERM the child's process group, escalating to SIGKILL
fn terminate_group(child: &mut Child) {
    let Ok(raw) = i32::try_from(child.id()) else {
        let _ = child.kill();
        let _ = child.wait();
        return;
    };
    let group = Pid::from_raw(raw);

    if let Err(e) = killpg(group, Signal::SIGTERM) {
        tracing::debug!("SIGTERM to process group {raw} failed: {e}");
    }
    match child.wait_timeout(TERMINATE_GRACE) {
        Ok(Some(_)) => {}
        _ => {
            if let Err(e) = killpg(group, Signal::SIGKILL) {
                tracing::debug!("SIGKILL to process group {raw} failed: {e}");
            }
            let _ = child.wait();
        }
    }
}
