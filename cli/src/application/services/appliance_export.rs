//! Application service — appliance export state machine.
//!
//! Drives the hypervisor through a fixed, linear sequence of steps. By
//! default a failing step halts the run and leaves the VM and disk exactly
//! as the last completed step left them. With [`RollbackPolicy::Compensate`]
//! the completed steps are undone in reverse order first.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{Hypervisor, ProgressReporter};
use crate::domain::ExportSpec;
use crate::domain::appliance::{EXPORT_BOOT_SETTINGS, HARDWARE_SETTINGS, OS_TYPE};

/// What to do with already-completed steps when a step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Halt and leave the VM and disk in their last state.
    #[default]
    LeaveAsIs,
    /// Undo completed steps in reverse order, best effort.
    Compensate,
}

/// One transition of the export state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStep {
    CreateVm,
    ConfigureHardware,
    AddStorageController,
    CompactDisk,
    AttachDisk,
    ConfigureBoot,
    Export,
    DetachDisk,
    CloseDisk,
    DeleteVm,
}

impl ExportStep {
    /// The full run, in order. Compaction precedes attach and detach
    /// precedes close.
    pub const SEQUENCE: [Self; 10] = [
        Self::CreateVm,
        Self::ConfigureHardware,
        Self::AddStorageController,
        Self::CompactDisk,
        Self::AttachDisk,
        Self::ConfigureBoot,
        Self::Export,
        Self::DetachDisk,
        Self::CloseDisk,
        Self::DeleteVm,
    ];

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CreateVm => "creating virtual machine",
            Self::ConfigureHardware => "configuring virtual machine",
            Self::AddStorageController => "setting up storage",
            Self::CompactDisk => "compacting disk image",
            Self::AttachDisk => "attaching disk image",
            Self::ConfigureBoot => "configuring boot for export",
            Self::Export => "exporting appliance",
            Self::DetachDisk => "detaching disk image",
            Self::CloseDisk => "unregistering disk image",
            Self::DeleteVm => "unregistering and deleting virtual machine",
        }
    }

    /// Steps that undo this one, pushed onto the undo stack once it
    /// completes. They run last-pushed first.
    #[must_use]
    pub fn compensations(self) -> &'static [Self] {
        match self {
            Self::CreateVm => &[Self::DeleteVm],
            // Compaction registers the medium with the manager.
            Self::CompactDisk => &[Self::CloseDisk],
            Self::AttachDisk => &[Self::DetachDisk],
            _ => &[],
        }
    }

    /// Teardown steps are their own compensation; completing one removes it
    /// from the undo stack.
    #[must_use]
    pub fn is_teardown(self) -> bool {
        matches!(self, Self::DetachDisk | Self::CloseDisk | Self::DeleteVm)
    }
}

impl std::fmt::Display for ExportStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Inputs of one export run.
pub struct ExportPlan<'a> {
    pub vm: &'a str,
    pub disk: &'a Path,
    pub export: &'a ExportSpec,
}

/// Run the export state machine.
///
/// # Errors
///
/// Returns the first failing step's error. Later steps are not attempted.
pub async fn export_appliance(
    hv: &impl Hypervisor,
    plan: &ExportPlan<'_>,
    policy: RollbackPolicy,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let mut undo: Vec<ExportStep> = Vec::new();

    for step in ExportStep::SEQUENCE {
        reporter.step(step.description());
        tracing::info!(vm = plan.vm, %step, "export step");

        if let Err(err) = apply(hv, step, plan).await {
            tracing::error!(vm = plan.vm, %step, error = %err, "export step failed");
            if policy == RollbackPolicy::Compensate {
                roll_back(hv, &undo, plan, reporter).await;
            }
            return Err(err.context(format!("{step} failed")));
        }

        if step.is_teardown() {
            undo.retain(|pending| *pending != step);
        }
        undo.extend_from_slice(step.compensations());
    }

    reporter.success(&format!("appliance exported to {}", plan.export.output.display()));
    Ok(())
}

async fn apply(hv: &impl Hypervisor, step: ExportStep, plan: &ExportPlan<'_>) -> Result<()> {
    match step {
        ExportStep::CreateVm => hv.create_vm(plan.vm, OS_TYPE).await,
        ExportStep::ConfigureHardware => hv.modify_vm(plan.vm, HARDWARE_SETTINGS).await,
        ExportStep::AddStorageController => hv.add_storage_controller(plan.vm).await,
        ExportStep::CompactDisk => hv.compact_disk(plan.disk).await,
        ExportStep::AttachDisk => hv.attach_disk(plan.vm, plan.disk).await,
        ExportStep::ConfigureBoot => hv.modify_vm(plan.vm, EXPORT_BOOT_SETTINGS).await,
        ExportStep::Export => hv.export_appliance(plan.vm, plan.export).await,
        ExportStep::DetachDisk => hv.detach_disk(plan.vm).await,
        ExportStep::CloseDisk => hv.close_disk(plan.disk).await,
        ExportStep::DeleteVm => hv.delete_vm(plan.vm).await,
    }
}

async fn roll_back(
    hv: &impl Hypervisor,
    undo: &[ExportStep],
    plan: &ExportPlan<'_>,
    reporter: &impl ProgressReporter,
) {
    for step in undo.iter().rev() {
        reporter.step(&format!("rolling back: {step}"));
        if let Err(err) = apply(hv, *step, plan).await {
            tracing::warn!(vm = plan.vm, %step, error = %err, "rollback step failed");
            reporter.warn(&format!("rollback step '{step}' failed: {err:#}"));
        }
    }
}
