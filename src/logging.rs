use tracing_subscriber::{EnvFilter, fmt};

/// Install the fmt subscriber once. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
