//! Tracing subscriber for the shopkeep binary.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = "shopkeep";

fn app_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber. `--verbose` raises the `shopkeep` target
/// to debug and switches to the multi-line formatter; `RUST_LOG` overrides
/// the default directive.
pub fn init_logging(verbose: bool) {
    let level = app_level(verbose);
    let app_filter = Targets::new().with_target(APP_TARGET, level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let registry = tracing_subscriber::registry()
        .with(app_filter)
        .with(env_filter);

    // Tests may have installed a subscriber already.
    let _ = if verbose {
        registry
            .with(fmt::layer().pretty().without_time())
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().without_time().with_target(false))
            .try_init()
    };
}
