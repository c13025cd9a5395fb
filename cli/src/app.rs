//! Application context — unified state passed to every command handler.

use crate::domain::{BuildEnvError, ToolError};
use crate::logging;
use crate::output::{OutputContext, TerminalReporter};

/// Exit code for a run cancelled with Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Output and logging flags passed from the top-level CLI.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable debug diagnostics.
    pub verbose: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
}

impl AppContext {
    /// Construct an `AppContext` and install diagnostic logging.
    #[must_use]
    pub fn new(flags: &OutputFlags) -> Self {
        logging::install_tracing(flags.verbose);
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
        }
    }

    /// Progress reporter writing to the terminal.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}

/// Process exit code for a failed command.
///
/// External tool failures propagate the tool's own exit code; everything
/// else exits `1`.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(tool) = cause.downcast_ref::<ToolError>() {
            return tool.exit_code();
        }
        if let Some(BuildEnvError::Interrupted { .. }) = cause.downcast_ref::<BuildEnvError>() {
            return EXIT_INTERRUPTED;
        }
    }
    1
}
