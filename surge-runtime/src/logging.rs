use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "surge=info,surge_runtime=info";
const VERBOSE_FILTER: &str = "surge=debug,surge_runtime=debug";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber installed by an embedding program stays in place.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
