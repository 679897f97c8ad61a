//! Logging initialization for toolchat.
//!
//! Diagnostics go to stderr through `tracing`; user-facing output stays on
//! stdout.

use tracing_subscriber::EnvFilter;

/// Filter directive when `RUST_LOG` is unset.
fn fallback_directive(verbose: bool, configured: &str) -> String {
    if verbose {
        format!("{}=debug", crate::constants::APP_NAME)
    } else {
        configured.to_string()
    }
}

/// Initialize the global tracing subscriber.
///
/// Precedence: `RUST_LOG`, then `--verbose`, then the configured level.
/// Call once at startup.
pub fn init_logging(verbose: bool, configured: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = fallback_directive(verbose, configured);
        EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln!("invalid log level {directive:?} ({e}), using warn");
            EnvFilter::new(crate::constants::DEFAULT_LOG_LEVEL)
        })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
