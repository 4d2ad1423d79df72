use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a stderr subscriber. `RUST_LOG` overrides the default filter.
///
/// Stdout stays reserved for the JSON report printed by the CLI.
pub fn init_logging(level: &str) {
    let default_filter = format!("wealth_optimizer={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("Warning: logging already initialized: {e}");
    }
}
