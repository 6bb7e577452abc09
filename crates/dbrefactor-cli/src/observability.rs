// Tracing initialization for the CLI. Logs go to stderr so stdout stays parseable.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level used when RUST_LOG is not set: `warn`, `-v` debug, `-vv` trace.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

pub fn init_tracing(verbosity: u8) {
    // Prefer RUST_LOG from env, otherwise use the verbosity level.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level_for(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(5), "trace");
    }
}
