//! Console logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` selects debug output
/// for the engine and warnings only are shown by default.
pub fn init(verbose: bool) {
    let default = if verbose {
        "refinery=debug,refinery_cli=debug,tower_http=debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(verbose)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
