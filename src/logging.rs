//! Tracing subscriber installation for the binary.

use tracing_subscriber::EnvFilter;

/// `--verbose` forces `debug`; otherwise `RUST_LOG` is honoured, falling back
/// to `info`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean for
/// command output. A second call is a no-op.
pub fn init_logging(json: bool, verbose: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
