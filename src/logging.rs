use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `LOG_LEVEL` and `LOG_FORMAT` override the configured values; `RUST_LOG`
/// directives win over both. Format `pretty` is meant for terminals,
/// anything else logs JSON lines.
pub fn init(level: &str, format: &str) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| level.to_string());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    let result = if format == "pretty" {
        subscriber.pretty().try_init()
    } else {
        subscriber.json().try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
