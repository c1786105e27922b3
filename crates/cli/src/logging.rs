//! Log setup. Events go to stderr so stdout stays free for `--json`.

use tabmerge_config::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for the run: `-v` wins over `-q`, both win over the
/// configured level.
pub fn filter_directive(configured: &str, verbose: bool, quiet: bool) -> String {
    if verbose {
        "debug".to_string()
    } else if quiet {
        "error".to_string()
    } else {
        configured.to_ascii_lowercase()
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `directive` when set.
/// A second call is a no-op.
pub fn init(directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init(),
    };
    if result.is_ok() {
        tracing::debug!(filter = %directive, "logging initialized");
    }
}
