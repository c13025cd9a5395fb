//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::{ExitStatus, Output};

use anyhow::Result;

use crate::domain::{ContainerRunSpec, ExportSpec, PackageConfig};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
///
/// No timeouts: every invocation is awaited until the child exits.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Container Runtime Port ────────────────────────────────────────────────────

/// Container runtime operations used by the build environment.
///
/// Every method fails with a [`crate::domain::ToolError`] when the runtime
/// exits non-zero.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Build `image` from `dockerfile` with `context` as the build context.
    async fn build_image(&self, image: &str, dockerfile: &str, context: &Path) -> Result<()>;
    /// Whether an image with this tag exists.
    async fn image_exists(&self, image: &str) -> Result<bool>;
    /// Delete an image.
    async fn remove_image(&self, image: &str) -> Result<()>;
    /// Whether a container with this name exists (running or not).
    async fn container_exists(&self, name: &str) -> Result<bool>;
    /// Force-remove a container.
    async fn remove_container(&self, name: &str) -> Result<()>;
    /// Create and run a container to completion.
    async fn run_container(&self, spec: &ContainerRunSpec) -> Result<()>;
}

// ── Hypervisor Port ───────────────────────────────────────────────────────────

/// Virtualization manager operations used by the appliance export.
///
/// Every method fails with a [`crate::domain::ToolError`] when the manager
/// exits non-zero.
#[allow(async_fn_in_trait)]
pub trait Hypervisor {
    /// Create and register a VM.
    async fn create_vm(&self, vm: &str, os_type: &str) -> Result<()>;
    /// Apply `(flag, value)` settings to a VM.
    async fn modify_vm(&self, vm: &str, settings: &[(&str, &str)]) -> Result<()>;
    /// Add the storage controller disks are attached to.
    async fn add_storage_controller(&self, vm: &str) -> Result<()>;
    /// Compact a disk image in place. The image must not be attached.
    async fn compact_disk(&self, disk: &Path) -> Result<()>;
    /// Attach a disk image as a non-rotational hard disk.
    async fn attach_disk(&self, vm: &str, disk: &Path) -> Result<()>;
    /// Export the VM as an appliance.
    async fn export_appliance(&self, vm: &str, spec: &ExportSpec) -> Result<()>;
    /// Detach whatever is attached at the disk slot.
    async fn detach_disk(&self, vm: &str) -> Result<()>;
    /// Drop a disk image from the media registry, keeping the file.
    async fn close_disk(&self, disk: &Path) -> Result<()>;
    /// Unregister the VM and delete its files (not attached media).
    async fn delete_vm(&self, vm: &str) -> Result<()>;
}

// ── Archive Port ──────────────────────────────────────────────────────────────

/// Writes compressed copies of disk images. Sources are never modified.
#[allow(async_fn_in_trait)]
pub trait DiskArchiver {
    /// Stream `source` through gzip at best compression into `dest`.
    async fn gzip(&self, source: &Path, dest: &Path) -> Result<()>;
    /// Write a zip at `dest` holding `source` as its single entry `entry_name`.
    async fn zip_single(&self, source: &Path, dest: &Path, entry_name: &str) -> Result<()>;
}

// ── Signal Port ───────────────────────────────────────────────────────────────

/// Resolves when the user asks the process to stop.
#[allow(async_fn_in_trait)]
pub trait InterruptSignal {
    async fn interrupted(&self);
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Filesystem and Config Ports ───────────────────────────────────────────────

/// Abstracts the local filesystem operations services need.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// Abstracts loading the packaging configuration.
pub trait ConfigStore {
    /// Load and validate the configuration at `path`.
    fn load(&self, path: &Path) -> Result<PackageConfig>;
}
