//! Application service — full packaging run.
//!
//! Checks that every source disk image exists, exports the appliance, then
//! writes the compressed sidecar archives.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{DiskArchiver, Hypervisor, LocalFs, ProgressReporter};
use crate::application::services::appliance_export::{
    ExportPlan, RollbackPolicy, export_appliance,
};
use crate::domain::{ExportSpec, PackageConfig, PackageError, PackageNames};

/// Paths of everything a packaging run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutputs {
    pub ova: PathBuf,
    pub qcow2_gz: PathBuf,
    pub vmdk_zip: PathBuf,
    pub vhdx_zip: PathBuf,
}

impl PackageOutputs {
    #[must_use]
    pub fn new(config: &PackageConfig, names: &PackageNames) -> Self {
        let dir = &config.output_dir;
        Self {
            ova: dir.join(names.ova()),
            qcow2_gz: dir.join(names.qcow2_archive()),
            vmdk_zip: dir.join(names.vmdk_archive()),
            vhdx_zip: dir.join(names.vhdx_archive()),
        }
    }

    /// All outputs, appliance first.
    #[must_use]
    pub fn all(&self) -> [&PathBuf; 4] {
        [&self.ova, &self.qcow2_gz, &self.vmdk_zip, &self.vhdx_zip]
    }
}

/// Collaborators of a packaging run.
pub struct PackageDeps<'a, H, A, F, P> {
    pub hypervisor: &'a H,
    pub archiver: &'a A,
    pub fs: &'a F,
    pub reporter: &'a P,
}

/// Run the whole packaging pipeline.
///
/// # Errors
///
/// Returns [`PackageError::MissingDisk`] before any external call if a
/// source image is missing, otherwise the first failing export or archive
/// step. Nothing is retried.
pub async fn run_package<H, A, F, P>(
    config: &PackageConfig,
    names: &PackageNames,
    policy: RollbackPolicy,
    deps: &PackageDeps<'_, H, A, F, P>,
) -> Result<PackageOutputs>
where
    H: Hypervisor,
    A: DiskArchiver,
    F: LocalFs,
    P: ProgressReporter,
{
    check_disk_images(deps.fs, config)?;

    let vdi = config.vdi_disk();
    let export = ExportSpec::new(config, names);
    let plan = ExportPlan {
        vm: &names.machine,
        disk: &vdi,
        export: &export,
    };
    export_appliance(deps.hypervisor, &plan, policy, deps.reporter).await?;

    let outputs = PackageOutputs::new(config, names);
    archive_disk_images(deps.archiver, config, names, &outputs, deps.reporter).await?;

    deps.reporter.success("package done");
    Ok(outputs)
}

/// Fail fast if any configured disk image is missing.
///
/// # Errors
///
/// Returns [`PackageError::MissingDisk`] naming the first missing image.
pub fn check_disk_images(fs: &impl LocalFs, config: &PackageConfig) -> Result<()> {
    for path in config.disk_images() {
        if !fs.exists(&path) {
            return Err(PackageError::MissingDisk { path }.into());
        }
    }
    Ok(())
}

/// Write the QCOW2, VMDK and VHDX archives.
///
/// # Errors
///
/// Returns the first archive failure.
pub async fn archive_disk_images(
    archiver: &impl DiskArchiver,
    config: &PackageConfig,
    names: &PackageNames,
    outputs: &PackageOutputs,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("compressing QCOW2 disk image");
    archiver
        .gzip(&config.qcow2_disk(), &outputs.qcow2_gz)
        .await
        .context("compressing QCOW2 disk image")?;

    reporter.step("zipping VMDK disk image");
    archiver
        .zip_single(&config.vmdk_disk(), &outputs.vmdk_zip, &names.vmdk_entry())
        .await
        .context("zipping VMDK disk image")?;

    reporter.step("zipping VHDX disk image");
    archiver
        .zip_single(&config.vhdx_disk(), &outputs.vhdx_zip, &names.vhdx_entry())
        .await
        .context("zipping VHDX disk image")?;

    reporter.success("archives written");
    Ok(())
}
