//! `warrior4-package` — export the appliance and write the archives.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::appliance_export::RollbackPolicy;
use crate::application::services::package::{PackageDeps, run_package};
use crate::domain::PackageNames;
use crate::infra::archive::LocalArchiver;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::TomlConfigStore;
use crate::infra::fs::LocalFs;
use crate::infra::vbox::VBoxManage;

/// Run `warrior4-package`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a disk image is
/// missing, or any export or archive step fails.
pub async fn run(app: &AppContext, config_path: &Path, policy: RollbackPolicy) -> Result<()> {
    let config = TomlConfigStore.load(config_path)?;
    let names = PackageNames::for_config(&config, Utc::now());

    app.output.kv("machine:", &names.machine);
    app.output
        .kv("output:", &config.output_dir.join(&names.base).display().to_string());

    let hypervisor = VBoxManage::new(TokioCommandRunner);
    let reporter = app.reporter();
    let deps = PackageDeps {
        hypervisor: &hypervisor,
        archiver: &LocalArchiver,
        fs: &LocalFs,
        reporter: &reporter,
    };
    let outputs = run_package(&config, &names, policy, &deps).await?;

    for path in outputs.all() {
        app.output.success(&path.display().to_string());
    }
    Ok(())
}
