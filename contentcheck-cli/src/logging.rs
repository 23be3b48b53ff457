//! Tracing initialisation for the command line.

use tracing_subscriber::EnvFilter;

/// Default filter for the number of `-v` flags given.
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`. Logs go to stderr so that
/// JSON reports on stdout stay machine readable.
pub fn init_tracing(verbose: u8) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
