//! Appliance naming and fixed virtual machine policy.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::domain::config::PackageConfig;

// ── Constants ────────────────────────────────────────────────────────────────

/// `strftime` format of the run timestamp shared by every artifact.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

pub const OS_TYPE: &str = "Linux_64";
pub const STORAGE_CONTROLLER: &str = "SATA Controller";
pub const STORAGE_BUS: &str = "sata";
pub const STORAGE_PORT_COUNT: u32 = 4;
/// Controller port and device the disk is attached at.
pub const DISK_PORT: u32 = 0;
pub const DISK_DEVICE: u32 = 0;

pub const PRODUCT: &str = "ArchiveTeam Warrior";
pub const VENDOR: &str = "ArchiveTeam";
pub const VENDOR_URL: &str = "http://www.archiveteam.org/";

/// Hardware and firmware settings applied right after the VM is created.
pub const HARDWARE_SETTINGS: &[(&str, &str)] = &[
    ("--memory", "512"),
    ("--vram", "16"),
    ("--acpi", "on"),
    ("--ioapic", "on"),
    ("--cpus", "1"),
    ("--rtcuseutc", "on"),
    ("--cpuhotplug", "off"),
    ("--pae", "on"),
    ("--hwvirtex", "on"),
    ("--nestedpaging", "on"),
    ("--largepages", "off"),
    ("--accelerate3d", "off"),
    ("--nic1", "nat"),
    ("--nictype1", "82540EM"),
    ("--natpf1", "Web interface,tcp,127.0.0.1,8001,,8001"),
    ("--audio-enabled", "off"),
    ("--audio-driver", "none"),
    ("--clipboard", "disabled"),
    ("--usb", "off"),
    ("--usbehci", "off"),
    ("--mouse", "ps2"),
    ("--keyboard", "ps2"),
    ("--biosbootmenu", "menuonly"),
];

/// Boot settings applied just before export so the appliance boots straight
/// from its disk without splash or menu.
pub const EXPORT_BOOT_SETTINGS: &[(&str, &str)] = &[
    ("--bioslogodisplaytime", "0"),
    ("--bioslogofadein", "off"),
    ("--bioslogofadeout", "off"),
    ("--boot1", "disk"),
    ("--boot2", "none"),
    ("--boot3", "none"),
    ("--boot4", "none"),
    ("--biosbootmenu", "disabled"),
];

// ── Naming ───────────────────────────────────────────────────────────────────

/// Names of every resource a packaging run creates.
///
/// All names embed the same UTC timestamp, so two runs never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNames {
    /// Transient VM name, `{app}-{version}-package-{timestamp}`.
    pub machine: String,
    /// Shared artifact basename, `{app}-v{version}-{timestamp}`.
    pub base: String,
    /// Name embedded in the exported appliance, `{app}-{version}`.
    pub appliance_vm_name: String,
}

impl PackageNames {
    #[must_use]
    pub fn new(app_name: &str, app_version: &str, timestamp: DateTime<Utc>) -> Self {
        let stamp = timestamp.format(TIMESTAMP_FORMAT);
        Self {
            machine: format!("{app_name}-{app_version}-package-{stamp}"),
            base: format!("{app_name}-v{app_version}-{stamp}"),
            appliance_vm_name: format!("{app_name}-{app_version}"),
        }
    }

    #[must_use]
    pub fn for_config(config: &PackageConfig, timestamp: DateTime<Utc>) -> Self {
        Self::new(&config.app_name, &config.app_version, timestamp)
    }

    #[must_use]
    pub fn ova(&self) -> String {
        format!("{}.ova", self.base)
    }

    #[must_use]
    pub fn qcow2_archive(&self) -> String {
        format!("{}.qcow2.gz", self.base)
    }

    #[must_use]
    pub fn vmdk_archive(&self) -> String {
        format!("{}.vmdk.zip", self.base)
    }

    #[must_use]
    pub fn vhdx_archive(&self) -> String {
        format!("{}.vhdx.zip", self.base)
    }

    /// Member name of the disk inside the VMDK zip.
    #[must_use]
    pub fn vmdk_entry(&self) -> String {
        format!("{}.vmdk", self.base)
    }

    /// Member name of the disk inside the VHDX zip.
    #[must_use]
    pub fn vhdx_entry(&self) -> String {
        format!("{}.vhdx", self.base)
    }
}

// ── Export parameters ────────────────────────────────────────────────────────

/// Parameters of the appliance export step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    pub output: PathBuf,
    pub version: String,
    pub vm_name: String,
}

impl ExportSpec {
    #[must_use]
    pub fn new(config: &PackageConfig, names: &PackageNames) -> Self {
        Self {
            output: config.output_dir.join(names.ova()),
            version: config.app_version.clone(),
            vm_name: names.appliance_vm_name.clone(),
        }
    }
}

/// Flatten `(flag, value)` settings into an argument list.
#[must_use]
pub fn settings_args(settings: &[(&str, &str)]) -> Vec<String> {
    settings
        .iter()
        .flat_map(|(flag, value)| [(*flag).to_string(), (*value).to_string()])
        .collect()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
