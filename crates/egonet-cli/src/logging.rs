use crate::cli::Cli;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Level chosen by flags, then the config file, then `info`
pub fn resolve_level(cli: &Cli, configured: &str) -> LevelFilter {
    if let Some(level) = cli.log_level {
        return level.into();
    }
    if cli.verbose {
        return LevelFilter::DEBUG;
    }
    LevelFilter::from_str(configured).unwrap_or(LevelFilter::INFO)
}

/// Install the global subscriber; logs go to stderr so reports on stdout stay parseable
///
/// `RUST_LOG` wins over `level` when set.
pub fn init(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
