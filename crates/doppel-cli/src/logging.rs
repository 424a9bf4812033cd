//! Diagnostic logging to stderr.

use crate::config::{LogFormat, Verbosity};
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags. Later calls are no-ops.
pub fn init(verbosity: Verbosity, format: LogFormat) {
    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let builder = fmt::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true);

        let installed = match format {
            LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
            LogFormat::Text => {
                tracing::subscriber::set_global_default(builder.compact().without_time().finish())
            }
        };
        if installed.is_err() {
            tracing::debug!("global subscriber already set");
        }
    });
}
