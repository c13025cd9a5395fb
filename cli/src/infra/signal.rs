//! Ctrl-C handling — implements `InterruptSignal`.

use crate::application::ports::InterruptSignal;

/// Resolves on the first SIGINT / Ctrl-C.
#[derive(Debug, Default, Clone, Copy)]
pub struct CtrlC;

impl InterruptSignal for CtrlC {
    async fn interrupted(&self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Without a handler the run simply cannot be interrupted here.
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
