//! Diagnostic logging setup.
//!
//! User-facing progress goes through `output`; `tracing` carries the
//! diagnostics (every external invocation, its arguments and exit status).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` and the
/// default is `warn`.
pub fn install_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let format = fmt::format().without_time().with_target(false).compact();
    let fmt_layer = fmt::layer().event_format(format).with_writer(std::io::stderr);

    // A second install (tests driving `Cli::run` repeatedly) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
