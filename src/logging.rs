use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the debug toggle picks between
/// `debug` and `info`.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}
