//! Domain types and validators for the packaging configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::error::ConfigError;

// ── Config schema ────────────────────────────────────────────────────────────

/// Packaging configuration, read from the shell-style `script/etc.sh`.
///
/// Every field is required; loading fails on the first missing key instead
/// of deferring to the step that would use it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageConfig {
    #[serde(rename = "APP_NAME")]
    pub app_name: String,
    #[serde(rename = "APP_VERSION")]
    pub app_version: String,
    #[serde(rename = "OUTPUT_DIR")]
    pub output_dir: PathBuf,
    #[serde(rename = "QCOW2_DISK_FILENAME")]
    pub qcow2_disk_filename: String,
    #[serde(rename = "VDI_DISK_FILENAME")]
    pub vdi_disk_filename: String,
    #[serde(rename = "VMDK_DISK_FILENAME")]
    pub vmdk_disk_filename: String,
    #[serde(rename = "VHDX_DISK_FILENAME")]
    pub vhdx_disk_filename: String,
}

impl PackageConfig {
    /// Parse configuration text.
    ///
    /// `path` is only used for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input or a missing key and
    /// [`ConfigError::Empty`] for a key set to an empty string.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] naming the first empty key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let output_dir = self.output_dir.to_string_lossy();
        let fields: [(&'static str, &str); 7] = [
            ("APP_NAME", &self.app_name),
            ("APP_VERSION", &self.app_version),
            ("OUTPUT_DIR", &output_dir),
            ("QCOW2_DISK_FILENAME", &self.qcow2_disk_filename),
            ("VDI_DISK_FILENAME", &self.vdi_disk_filename),
            ("VMDK_DISK_FILENAME", &self.vmdk_disk_filename),
            ("VHDX_DISK_FILENAME", &self.vhdx_disk_filename),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((key, _)) => Err(ConfigError::Empty { key: *key }),
            None => Ok(()),
        }
    }

    /// Absolute or working-directory-relative path of the QCOW2 source image.
    #[must_use]
    pub fn qcow2_disk(&self) -> PathBuf {
        self.output_dir.join(&self.qcow2_disk_filename)
    }

    /// Path of the VDI image attached to the packaging VM.
    #[must_use]
    pub fn vdi_disk(&self) -> PathBuf {
        self.output_dir.join(&self.vdi_disk_filename)
    }

    #[must_use]
    pub fn vmdk_disk(&self) -> PathBuf {
        self.output_dir.join(&self.vmdk_disk_filename)
    }

    #[must_use]
    pub fn vhdx_disk(&self) -> PathBuf {
        self.output_dir.join(&self.vhdx_disk_filename)
    }

    /// All four source images, in the order they are consumed.
    #[must_use]
    pub fn disk_images(&self) -> [PathBuf; 4] {
        [
            self.vdi_disk(),
            self.qcow2_disk(),
            self.vmdk_disk(),
            self.vhdx_disk(),
        ]
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
