//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::application::services::appliance_export::RollbackPolicy;
use crate::application::services::build_env::BuildEnv;
use crate::commands;
use crate::domain::BuildEnvNames;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::DEFAULT_CONFIG_PATH;
use crate::infra::docker::DockerCli;

/// Flags shared by both binaries.
#[derive(Args)]
pub struct GlobalArgs {
    /// Show debug diagnostics (external commands and their exit status)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (`NO_COLOR` is honoured as well)
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalArgs {
    fn flags(&self) -> OutputFlags {
        OutputFlags {
            no_color: self.no_color,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

// ── warrior4-env ──────────────────────────────────────────────────────────────

/// Run warrior4 build scripts within a Docker container
#[derive(Parser)]
#[command(
    name = "warrior4-env",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct EnvCli {
    /// Docker daemon address
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub host: Option<String>,

    /// Suffix for the image and container names, so several environments
    /// can share one daemon
    #[arg(long, global = true, value_name = "SUFFIX")]
    pub instance: Option<String>,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: EnvCommand,
}

#[derive(Subcommand)]
pub enum EnvCommand {
    /// Create Docker build environment image
    Init,

    /// Delete Docker build environment image and any build container
    Remove,

    /// Run build.sh within a build container
    Build(commands::env::BuildArgs),

    /// Run apk.sh within a build container
    Apk,
}

impl EnvCli {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; external tool failures carry
    /// their exit code.
    pub async fn run(self) -> Result<()> {
        let EnvCli {
            host,
            instance,
            global,
            command,
        } = self;
        let app = AppContext::new(&global.flags());

        let runtime = DockerCli::new(TokioCommandRunner, host);
        let names = instance
            .as_deref()
            .map_or_else(|| Ok(BuildEnvNames::default()), BuildEnvNames::with_suffix)?;
        let source_root = std::env::current_dir().context("cannot determine source root")?;
        let env = BuildEnv::new(&runtime, names, source_root);

        match command {
            EnvCommand::Init => commands::env::init(&app, &env).await,
            EnvCommand::Remove => commands::env::remove(&app, &env).await,
            EnvCommand::Build(args) => commands::env::build(&app, &env, args).await,
            EnvCommand::Apk => commands::env::apk(&app, &env).await,
        }
    }
}

// ── warrior4-package ──────────────────────────────────────────────────────────

/// Package the disk images into a virtual appliance and distributable archives
#[derive(Parser)]
#[command(name = "warrior4-package", version)]
pub struct PackageCli {
    /// Packaging configuration (shell-style KEY="value" file)
    #[arg(
        long,
        value_name = "PATH",
        env = "WARRIOR4_PACKAGE_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Undo completed export steps if a later one fails
    #[arg(long)]
    pub rollback: bool,

    #[command(flatten)]
    pub global: GlobalArgs,
}

impl PackageCli {
    /// Execute the packaging run.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, export or archiving fails.
    pub async fn run(self) -> Result<()> {
        let app = AppContext::new(&self.global.flags());
        let policy = if self.rollback {
            RollbackPolicy::Compensate
        } else {
            RollbackPolicy::LeaveAsIs
        };
        commands::package::run(&app, &self.config, policy).await
    }
}
