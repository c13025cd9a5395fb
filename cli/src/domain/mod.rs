//! Domain layer — pure types, naming rules and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod appliance;
pub mod build_env;
pub mod config;
pub mod error;

pub use appliance::{ExportSpec, PackageNames};
pub use build_env::{BuildEnvNames, ContainerRunSpec, DeviceAccess, EntryPoint};
pub use config::PackageConfig;
pub use error::{BuildEnvError, ConfigError, PackageError, ToolError};
