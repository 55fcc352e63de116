use std::io::{stderr, IsTerminal};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "warn";

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_LOG_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the stderr logger. `RUST_LOG` wins over `verbosity`.
pub fn init_logger(verbosity: u8) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let console_layer = fmt::layer()
        .with_writer(stderr)
        .with_ansi(stderr().is_terminal())
        .with_level(true)
        .without_time()
        .compact()
        .with_filter(env_filter);

    registry().with(console_layer).try_init()?;

    Ok(())
}
