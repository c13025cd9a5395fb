//! Application service — build environment lifecycle.
//!
//! Owns the guarantee that an execution container never outlives the
//! invocation that started it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{ContainerRuntime, InterruptSignal, LocalFs, ProgressReporter};
use crate::domain::build_env::{self, DOCKERFILE};
use crate::domain::{BuildEnvError, BuildEnvNames, ContainerRunSpec, DeviceAccess, EntryPoint};

/// Build environment bound to one source tree and one pair of names.
pub struct BuildEnv<'a, R: ContainerRuntime> {
    runtime: &'a R,
    names: BuildEnvNames,
    source_root: PathBuf,
}

impl<'a, R: ContainerRuntime> BuildEnv<'a, R> {
    #[must_use]
    pub fn new(runtime: &'a R, names: BuildEnvNames, source_root: PathBuf) -> Self {
        Self {
            runtime,
            names,
            source_root,
        }
    }

    #[must_use]
    pub fn names(&self) -> &BuildEnvNames {
        &self.names
    }

    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Build the environment image. Re-running overwrites the tag.
    ///
    /// # Errors
    ///
    /// Returns the runtime's failure if the image build exits non-zero.
    pub async fn init(&self, reporter: &impl ProgressReporter) -> Result<()> {
        reporter.step(&format!("creating image {}", self.names.image));
        self.runtime
            .build_image(&self.names.image, DOCKERFILE, &self.source_root)
            .await
            .with_context(|| format!("building image {}", self.names.image))?;
        reporter.success(&format!("image {} created", self.names.image));
        Ok(())
    }

    /// Remove any leftover container, then the environment image.
    ///
    /// Absent resources are skipped, so running this twice succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if removal of an existing container or image fails
    /// (for example, the image is still in use). Nothing is retried.
    pub async fn remove(&self, reporter: &impl ProgressReporter) -> Result<()> {
        self.remove_container(reporter).await?;

        if !self.runtime.image_exists(&self.names.image).await? {
            reporter.warn(&format!("image {} not present", self.names.image));
            return Ok(());
        }
        reporter.step("removing image");
        self.runtime
            .remove_image(&self.names.image)
            .await
            .with_context(|| format!("removing image {}", self.names.image))?;
        reporter.success(&format!("image {} removed", self.names.image));
        Ok(())
    }

    /// Run `./script/build.sh` with the given device access.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub async fn build(
        &self,
        access: DeviceAccess,
        fs: &impl LocalFs,
        signal: &impl InterruptSignal,
        reporter: &impl ProgressReporter,
    ) -> Result<()> {
        self.run(EntryPoint::Build, Some(access), fs, signal, reporter)
            .await
    }

    /// Run `./script/apk.sh`. No device access is granted.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub async fn apk(
        &self,
        fs: &impl LocalFs,
        signal: &impl InterruptSignal,
        reporter: &impl ProgressReporter,
    ) -> Result<()> {
        self.run(EntryPoint::Apk, None, fs, signal, reporter).await
    }

    /// Run one execution container to completion.
    ///
    /// The container is removed afterwards whether the run succeeded,
    /// failed, or was interrupted.
    ///
    /// # Errors
    ///
    /// Returns the run's failure (carrying the container's exit code),
    /// [`BuildEnvError::Interrupted`] on Ctrl-C, or the cleanup failure when
    /// the run itself succeeded.
    pub async fn run(
        &self,
        entry_point: EntryPoint,
        device: Option<DeviceAccess>,
        fs: &impl LocalFs,
        signal: &impl InterruptSignal,
        reporter: &impl ProgressReporter,
    ) -> Result<()> {
        ensure_cache_dir(fs, &self.source_root)?;

        // Stale container from an earlier abnormal exit.
        self.remove_container(reporter).await?;

        let spec = ContainerRunSpec::new(&self.names, &self.source_root, entry_point, device);
        reporter.step(&format!("running {} in container", entry_point.command()));
        tracing::debug!(container = %spec.name, image = %spec.image, "starting execution container");

        let outcome = tokio::select! {
            result = self.runtime.run_container(&spec) => result,
            () = signal.interrupted() => Err(BuildEnvError::Interrupted {
                container: spec.name.clone(),
            }
            .into()),
        };

        let cleanup = self.remove_container(reporter).await;

        match (outcome, cleanup) {
            (Ok(()), Ok(())) => {
                reporter.success(&format!("{} finished", entry_point.command()));
                Ok(())
            }
            (Ok(()), Err(cleanup_err)) => Err(cleanup_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                tracing::warn!(error = %cleanup_err, "container cleanup failed");
                reporter.warn(&format!("container cleanup failed: {cleanup_err:#}"));
                Err(err)
            }
        }
    }

    /// Force-remove the execution container if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if inspecting or removing the container fails.
    pub async fn remove_container(&self, reporter: &impl ProgressReporter) -> Result<()> {
        let name = &self.names.container;
        if !self.runtime.container_exists(name).await? {
            return Ok(());
        }
        reporter.step(&format!("removing container {name}"));
        self.runtime
            .remove_container(name)
            .await
            .with_context(|| format!("removing container {name}"))
    }
}

/// Create the dependency cache directory if it is missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_cache_dir(fs: &impl LocalFs, source_root: &Path) -> Result<()> {
    let dir = build_env::cache_dir(source_root);
    if fs.exists(&dir) {
        return Ok(());
    }
    tracing::debug!(path = %dir.display(), "creating dependency cache");
    fs.create_dir_all(&dir)
}
