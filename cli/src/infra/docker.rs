//! Infrastructure implementation of the `ContainerRuntime` port.
//!
//! `DockerCli<R>` routes every `docker` invocation through a `CommandRunner`
//! and prefixes `--host <ADDRESS>` when a remote daemon is configured.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ContainerRuntime};
use crate::domain::ContainerRunSpec;
use crate::infra::command_runner::ensure_success;

/// Program name of the container runtime CLI.
pub const DOCKER: &str = "docker";

/// Messages docker prints when the inspected object does not exist.
const NOT_FOUND_MARKERS: [&str; 3] = ["No such image", "No such container", "No such object"];

fn is_not_found(stderr: &str) -> bool {
    NOT_FOUND_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Docker CLI adapter.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct DockerCli<R: CommandRunner> {
    runner: R,
    host: Option<String>,
}

impl<R: CommandRunner> DockerCli<R> {
    /// Create an adapter talking to `host`, or the local default daemon.
    pub fn new(runner: R, host: Option<String>) -> Self {
        Self { runner, host }
    }

    /// Full argument list: global options followed by `args`.
    fn args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(host) = &self.host {
            full.push("--host");
            full.push(host.as_str());
        }
        full.extend_from_slice(args);
        full
    }

    /// Run with inherited stdio; non-zero exit is an error.
    async fn run_checked(&self, args: &[&str]) -> Result<()> {
        let full = self.args(args);
        let status = self.runner.run_status(DOCKER, &full).await?;
        ensure_success(DOCKER, &full, status)?;
        Ok(())
    }

    /// Run an `inspect` with captured output.
    ///
    /// Only docker's own "no such object" answer means absent; any other
    /// failure (daemon unreachable, bad host, auth) is an error.
    async fn inspect(&self, args: &[&str]) -> Result<bool> {
        let full = self.args(args);
        let output = self.runner.run(DOCKER, &full).await?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_found(&stderr) {
            return Ok(false);
        }
        tracing::warn!(stderr = %stderr.trim(), "docker inspect failed");
        ensure_success(DOCKER, &full, output.status)
            .with_context(|| stderr.trim().to_string())?;
        Ok(true)
    }
}

impl<R: CommandRunner> ContainerRuntime for DockerCli<R> {
    async fn build_image(&self, image: &str, dockerfile: &str, context: &Path) -> Result<()> {
        let context = context
            .to_str()
            .context("build context path is not valid UTF-8")?;
        self.run_checked(&["build", "--file", dockerfile, "--tag", image, context])
            .await
            .context("docker build")
    }

    async fn image_exists(&self, image: &str) -> Result<bool> {
        self.inspect(&["image", "inspect", image])
            .await
            .context("docker image inspect")
    }

    async fn remove_image(&self, image: &str) -> Result<()> {
        self.run_checked(&["image", "rm", image])
            .await
            .context("docker image rm")
    }

    async fn container_exists(&self, name: &str) -> Result<bool> {
        self.inspect(&["container", "inspect", name])
            .await
            .context("docker container inspect")
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let full = self.args(&["container", "rm", "--force", name]);
        let output = self
            .runner
            .run(DOCKER, &full)
            .await
            .context("docker container rm")?;
        if !output.status.success() {
            tracing::warn!(
                container = name,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "docker container rm failed"
            );
        }
        ensure_success(DOCKER, &full, output.status)?;
        Ok(())
    }

    async fn run_container(&self, spec: &ContainerRunSpec) -> Result<()> {
        let run_args = spec.run_args();
        let mut args = vec!["container", "run"];
        args.extend(run_args.iter().map(String::as_str));
        self.run_checked(&args).await
    }
}
