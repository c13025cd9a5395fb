//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── External tool errors ──────────────────────────────────────────────────────

/// An external CLI tool (`docker`, `VBoxManage`) did not succeed.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{program} {args}` exited with status {code}")]
    Exited {
        program: String,
        args: String,
        code: i32,
    },

    #[error("`{program} {args}` was terminated by a signal")]
    Signalled { program: String, args: String },
}

impl ToolError {
    /// Process exit code to propagate for this failure.
    ///
    /// Signal terminations map to `1`; the shell convention of `128 + n` is
    /// not recoverable from the status on every platform.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited { code, .. } => *code,
            Self::Signalled { .. } => 1,
        }
    }
}

// ── Build environment errors ──────────────────────────────────────────────────

/// Errors raised by the build-environment orchestrator itself.
#[derive(Debug, Error)]
pub enum BuildEnvError {
    #[error("--device and --privileged are mutually exclusive. Pick one.")]
    DeviceModeConflict,

    #[error("build needs device access: pass --device <PATH> or --privileged")]
    DeviceModeMissing,

    #[error("interrupted while container '{container}' was running")]
    Interrupted { container: String },

    #[error(
        "invalid --instance '{suffix}': use lowercase letters, digits, '.', '_' or '-', \
         starting and ending with a letter or digit"
    )]
    InvalidInstance { suffix: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to loading the packaging configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Invalid configuration {}:\n{reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Configuration value {key} must not be empty")]
    Empty { key: &'static str },
}

// ── Packaging errors ──────────────────────────────────────────────────────────

/// Errors raised by the appliance packaging pipeline.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Disk image not found: {}\n\nBuild the disk images before packaging.", path.display())]
    MissingDisk { path: PathBuf },
}
