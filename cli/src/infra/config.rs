//! Infrastructure implementation of the `ConfigStore` port.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::{ConfigError, PackageConfig};

/// Default location of the packaging configuration, relative to the
/// source root.
pub const DEFAULT_CONFIG_PATH: &str = "script/etc.sh";

/// Production implementation of `ConfigStore` reading the shell-style
/// `KEY="value"` file as TOML.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlConfigStore;

impl ConfigStore for TomlConfigStore {
    fn load(&self, path: &Path) -> Result<PackageConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = PackageConfig::parse(&content, path)?;
        tracing::debug!(path = %path.display(), app = %config.app_name, "configuration loaded");
        Ok(config)
    }
}
