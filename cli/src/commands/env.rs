//! `warrior4-env init|remove|build|apk` — build environment commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ContainerRuntime, ProgressReporter};
use crate::application::services::build_env::BuildEnv;
use crate::domain::DeviceAccess;
use crate::infra::fs::LocalFs;
use crate::infra::signal::CtrlC;

/// Arguments for the build command.
///
/// Exactly one of `--device` and `--privileged` is required.
#[derive(Args)]
pub struct BuildArgs {
    /// Host device to pass into the container (a /dev/nbd* device)
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Allow the container to access all host devices (very risky!)
    #[arg(long)]
    pub privileged: bool,
}

/// Run `warrior4-env init`.
///
/// # Errors
///
/// Returns an error if the image build fails.
pub async fn init(app: &AppContext, env: &BuildEnv<'_, impl ContainerRuntime>) -> Result<()> {
    env.init(&app.reporter()).await
}

/// Run `warrior4-env remove`.
///
/// # Errors
///
/// Returns an error if an existing container or image cannot be removed.
pub async fn remove(app: &AppContext, env: &BuildEnv<'_, impl ContainerRuntime>) -> Result<()> {
    env.remove(&app.reporter()).await
}

/// Run `warrior4-env build`.
///
/// Device flags are validated before anything touches the runtime.
///
/// # Errors
///
/// Returns an error for an invalid flag combination or a failed run.
pub async fn build(
    app: &AppContext,
    env: &BuildEnv<'_, impl ContainerRuntime>,
    args: BuildArgs,
) -> Result<()> {
    let access = DeviceAccess::from_flags(args.device, args.privileged)?;
    let reporter = app.reporter();
    if access == DeviceAccess::Privileged {
        reporter.warn("container runs privileged with access to all host devices");
    }
    env.build(access, &LocalFs, &CtrlC, &reporter).await
}

/// Run `warrior4-env apk`.
///
/// # Errors
///
/// Returns an error if the run fails.
pub async fn apk(app: &AppContext, env: &BuildEnv<'_, impl ContainerRuntime>) -> Result<()> {
    env.apk(&LocalFs, &CtrlC, &app.reporter()).await
}
