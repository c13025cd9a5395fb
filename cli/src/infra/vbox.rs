//! Infrastructure implementation of the `Hypervisor` port on `VBoxManage`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, Hypervisor};
use crate::domain::ExportSpec;
use crate::domain::appliance::{
    DISK_DEVICE, DISK_PORT, PRODUCT, STORAGE_BUS, STORAGE_CONTROLLER, STORAGE_PORT_COUNT, VENDOR,
    VENDOR_URL, settings_args,
};
use crate::infra::command_runner::ensure_success;

/// Program name of the VirtualBox management CLI.
pub const VBOXMANAGE: &str = "VBoxManage";

/// `VBoxManage` adapter.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct VBoxManage<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> VBoxManage<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn vbox(&self, args: &[&str]) -> Result<()> {
        let status = self.runner.run_status(VBOXMANAGE, args).await?;
        ensure_success(VBOXMANAGE, args, status)?;
        Ok(())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

impl<R: CommandRunner> Hypervisor for VBoxManage<R> {
    async fn create_vm(&self, vm: &str, os_type: &str) -> Result<()> {
        self.vbox(&["createvm", "--name", vm, "--ostype", os_type, "--register"])
            .await
            .context("VBoxManage createvm")
    }

    async fn modify_vm(&self, vm: &str, settings: &[(&str, &str)]) -> Result<()> {
        let settings = settings_args(settings);
        let mut args = vec!["modifyvm", vm];
        args.extend(settings.iter().map(String::as_str));
        self.vbox(&args).await.context("VBoxManage modifyvm")
    }

    async fn add_storage_controller(&self, vm: &str) -> Result<()> {
        let port_count = STORAGE_PORT_COUNT.to_string();
        self.vbox(&[
            "storagectl",
            vm,
            "--name",
            STORAGE_CONTROLLER,
            "--add",
            STORAGE_BUS,
            "--portcount",
            &port_count,
        ])
        .await
        .context("VBoxManage storagectl")
    }

    async fn compact_disk(&self, disk: &Path) -> Result<()> {
        self.vbox(&["modifymedium", "--compact", path_str(disk)?])
            .await
            .context("VBoxManage modifymedium --compact")
    }

    async fn attach_disk(&self, vm: &str, disk: &Path) -> Result<()> {
        let port = DISK_PORT.to_string();
        let device = DISK_DEVICE.to_string();
        self.vbox(&[
            "storageattach",
            vm,
            "--storagectl",
            STORAGE_CONTROLLER,
            "--port",
            &port,
            "--device",
            &device,
            "--type",
            "hdd",
            "--nonrotational",
            "on",
            "--medium",
            path_str(disk)?,
        ])
        .await
        .context("VBoxManage storageattach")
    }

    async fn export_appliance(&self, vm: &str, spec: &ExportSpec) -> Result<()> {
        self.vbox(&[
            "export",
            vm,
            "--output",
            path_str(&spec.output)?,
            "--vsys",
            "0",
            "--ovf20",
            "--manifest",
            "--product",
            PRODUCT,
            "--vendor",
            VENDOR,
            "--vendorurl",
            VENDOR_URL,
            "--version",
            &spec.version,
            "--vmname",
            &spec.vm_name,
        ])
        .await
        .context("VBoxManage export")
    }

    async fn detach_disk(&self, vm: &str) -> Result<()> {
        let port = DISK_PORT.to_string();
        let device = DISK_DEVICE.to_string();
        self.vbox(&[
            "storageattach",
            vm,
            "--storagectl",
            STORAGE_CONTROLLER,
            "--port",
            &port,
            "--device",
            &device,
            "--medium",
            "none",
        ])
        .await
        .context("VBoxManage storageattach --medium none")
    }

    async fn close_disk(&self, disk: &Path) -> Result<()> {
        self.vbox(&["closemedium", path_str(disk)?])
            .await
            .context("VBoxManage closemedium")
    }

    async fn delete_vm(&self, vm: &str) -> Result<()> {
        self.vbox(&["unregistervm", vm, "--delete"])
            .await
            .context("VBoxManage unregistervm")
    }
}
