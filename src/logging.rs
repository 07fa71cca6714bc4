use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
fn default_directive(debug: bool) -> &'static str {
    if debug { "aicmd=debug,warn" } else { "warn" }
}

/// Installs the global stderr subscriber. Call sites log unconditionally;
/// debug events only reach the terminal when `debug` is set.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
