//! Crate-standard logging setup.

use tracing_subscriber::EnvFilter;

/// Install the global [`tracing`] subscriber at the requested verbosity.
///
/// `RUST_LOG` takes precedence over `verbosity` so individual targets can
/// still be tuned from the environment.
pub fn setup(verbosity: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
