use crate::config::AppConfig;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber, honoring `RUST_LOG` when set and
/// the configured level/format otherwise. `log` macro output is bridged in.
pub fn init_subscriber(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = Registry::default().with(filter);

    let result = if config.log_format == "json" {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if result.is_ok() {
        tracing_log::LogTracer::init().ok();
    }
}
