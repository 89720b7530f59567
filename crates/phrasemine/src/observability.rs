//! Logging and tracing bootstrap for the CLI.

use tracing_subscriber::EnvFilter;

/// Build the log filter from CLI verbosity and the configured level.
///
/// `RUST_LOG` wins when set. Otherwise `-q` forces errors only and each
/// `-v` raises the level (configured → debug → trace).
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(level_for(quiet, verbose, config_level))
}

/// Install the global fmt subscriber, writing to stderr so stdout stays
/// clean for results and `--json` output.
pub fn init(filter: EnvFilter) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

fn level_for<'a>(quiet: bool, verbose: u8, config_level: &'a str) -> &'a str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => config_level,
        1 => "debug",
        _ => "trace",
    }
}
