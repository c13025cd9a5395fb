//! Build environment identities and container run parameters.
//!
//! Pure data: nothing here talks to the container runtime.

use std::path::{Path, PathBuf};

use crate::domain::error::BuildEnvError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Default tag of the environment image.
pub const DEFAULT_IMAGE_NAME: &str = "warrior4-vm-ubuntu-build-env";
/// Default name of the one-shot execution container.
pub const DEFAULT_CONTAINER_NAME: &str = "warrior4-vm-build-env";

/// Build context definition, relative to the source root.
pub const DOCKERFILE: &str = "script/Dockerfile";
/// Dependency cache, relative to the source root.
pub const CACHE_DIR: &str = "target/registry/";

/// Mount point of the source tree inside the container (also the workdir).
pub const CONTAINER_SOURCE_DIR: &str = "/home/ubuntu/warrior4-vm/";
/// Mount point of the dependency cache inside the container.
pub const CONTAINER_CACHE_DIR: &str = "/home/ubuntu/.cargo/registry/";

// ── Names ────────────────────────────────────────────────────────────────────

/// Names of the environment image and execution container.
///
/// At most one container with `container` may exist at a time, so runs that
/// must coexist on one daemon need distinct names (see [`Self::with_suffix`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvNames {
    pub image: String,
    pub container: String,
}

impl Default for BuildEnvNames {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE_NAME.to_string(),
            container: DEFAULT_CONTAINER_NAME.to_string(),
        }
    }
}

impl BuildEnvNames {
    /// Default names with `-{suffix}` appended to both.
    ///
    /// # Errors
    ///
    /// Returns [`BuildEnvError::InvalidInstance`] unless the suffix keeps the
    /// image name a valid docker reference: lowercase letters, digits, `.`,
    /// `_` and `-`, starting and ending with a letter or digit.
    pub fn with_suffix(suffix: &str) -> Result<Self, BuildEnvError> {
        if !is_valid_suffix(suffix) {
            return Err(BuildEnvError::InvalidInstance {
                suffix: suffix.to_string(),
            });
        }
        Ok(Self {
            image: format!("{DEFAULT_IMAGE_NAME}-{suffix}"),
            container: format!("{DEFAULT_CONTAINER_NAME}-{suffix}"),
        })
    }
}

fn is_valid_suffix(suffix: &str) -> bool {
    let edge = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let (Some(first), Some(last)) = (suffix.chars().next(), suffix.chars().next_back()) else {
        return false;
    };
    edge(first)
        && edge(last)
        && suffix
            .chars()
            .all(|c| edge(c) || matches!(c, '.' | '_' | '-'))
}

// ── Device access ────────────────────────────────────────────────────────────

/// How the build container reaches host block devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAccess {
    /// Pass a single host device node (a `/dev/nbd*` device) through.
    Device(PathBuf),
    /// Full access to all host devices. Very risky.
    Privileged,
}

impl DeviceAccess {
    /// Resolve the mutually exclusive `--device` / `--privileged` flags.
    ///
    /// # Errors
    ///
    /// Returns [`BuildEnvError::DeviceModeConflict`] when both are given and
    /// [`BuildEnvError::DeviceModeMissing`] when neither is.
    pub fn from_flags(device: Option<PathBuf>, privileged: bool) -> Result<Self, BuildEnvError> {
        match (device, privileged) {
            (Some(_), true) => Err(BuildEnvError::DeviceModeConflict),
            (Some(path), false) => Ok(Self::Device(path)),
            (None, true) => Ok(Self::Privileged),
            (None, false) => Err(BuildEnvError::DeviceModeMissing),
        }
    }

    /// Container runtime arguments for this access mode.
    #[must_use]
    pub fn runtime_args(&self) -> Vec<String> {
        match self {
            Self::Device(path) => vec!["--device".to_string(), path.display().to_string()],
            Self::Privileged => vec!["--privileged".to_string()],
        }
    }
}

// ── Run spec ─────────────────────────────────────────────────────────────────

/// In-container entry point of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// `./script/build.sh` — builds the disk images.
    Build,
    /// `./script/apk.sh` — builds the Alpine packages.
    Apk,
}

impl EntryPoint {
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            Self::Build => "./script/build.sh",
            Self::Apk => "./script/apk.sh",
        }
    }
}

/// A read-write bind mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
}

impl BindMount {
    /// Value for `--mount`.
    #[must_use]
    pub fn to_mount_arg(&self) -> String {
        format!(
            "type=bind,source={},target={}",
            self.source.display(),
            self.target
        )
    }
}

/// Everything needed to start one execution container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRunSpec {
    pub name: String,
    pub image: String,
    pub mounts: Vec<BindMount>,
    pub workdir: String,
    pub device: Option<DeviceAccess>,
    pub entry_point: EntryPoint,
}

impl ContainerRunSpec {
    /// Standard run: source tree and dependency cache mounted, workdir at
    /// the mounted source root.
    #[must_use]
    pub fn new(
        names: &BuildEnvNames,
        source_root: &Path,
        entry_point: EntryPoint,
        device: Option<DeviceAccess>,
    ) -> Self {
        Self {
            name: names.container.clone(),
            image: names.image.clone(),
            mounts: vec![
                BindMount {
                    source: source_root.to_path_buf(),
                    target: CONTAINER_SOURCE_DIR.to_string(),
                },
                BindMount {
                    source: cache_dir(source_root),
                    target: CONTAINER_CACHE_DIR.to_string(),
                },
            ],
            workdir: CONTAINER_SOURCE_DIR.to_string(),
            device,
            entry_point,
        }
    }

    /// Arguments following `container run`.
    #[must_use]
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec!["--name".to_string(), self.name.clone()];
        for mount in &self.mounts {
            args.push("--mount".to_string());
            args.push(mount.to_mount_arg());
        }
        args.push("--workdir".to_string());
        args.push(self.workdir.clone());
        if let Some(device) = &self.device {
            args.extend(device.runtime_args());
        }
        args.push(self.image.clone());
        args.push(self.entry_point.command().to_string());
        args
    }
}

/// Dependency cache directory for a source root.
#[must_use]
pub fn cache_dir(source_root: &Path) -> PathBuf {
    source_root.join(CACHE_DIR)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
