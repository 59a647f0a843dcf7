use hostq_domain::Config;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber from configuration.
///
/// A `RUST_LOG` environment filter takes precedence over the configured
/// level when present.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
