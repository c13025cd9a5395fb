//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution. Children are killed if the awaiting future
//! is dropped.

use std::process::{ExitStatus, Output, Stdio};

use anyhow::{Context, Result};

use crate::application::ports::CommandRunner;
use crate::domain::ToolError;

/// Production `CommandRunner`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(program, ?args, "exec (captured)");
        // `output()` reads stdout and stderr concurrently with `wait()`, so a
        // chatty child cannot fill a pipe and deadlock.
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to spawn {program}"))?;
        tracing::debug!(
            program,
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "exec finished"
        );
        Ok(output)
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        tracing::debug!(program, ?args, "exec");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))?;
        tracing::info!(program, %status, "exec finished");
        Ok(status)
    }
}

/// Map a non-successful exit status to a [`ToolError`].
///
/// # Errors
///
/// Returns [`ToolError::Exited`] carrying the exit code, or
/// [`ToolError::Signalled`] when there is none.
pub fn ensure_success(program: &str, args: &[&str], status: ExitStatus) -> Result<(), ToolError> {
    if status.success() {
        return Ok(());
    }
    let args = args.join(" ");
    match status.code() {
        Some(code) => Err(ToolError::Exited {
            program: program.to_string(),
            args,
            code,
        }),
        None => Err(ToolError::Signalled {
            program: program.to_string(),
            args,
        }),
    }
}
