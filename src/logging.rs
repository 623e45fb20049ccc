use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber for the monitor's tracing output
///
/// `filter` takes `EnvFilter` directives; without it `RUST_LOG` is used,
/// then `info`. Returns `false` if a global subscriber was already set.
pub fn init(filter: Option<&str>) -> bool {
    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok()
}
