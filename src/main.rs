//! Pulsefeed server binary
//!
//! Reads JSON command records from stdin and writes one JSON response per
//! command to stdout. With no arguments the server runs sequentially;
//! with a single integer argument it runs a parallel consumer pool of
//! that size.

use clap::{Arg, Command};
use tracing::info;

use pulsefeed::core::config::{self, Mode};
use pulsefeed::Result;

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("pulsefeed")
        .version(pulsefeed::VERSION)
        .about("Concurrent timestamp-ordered feed server.")
        .arg(
            Arg::new("consumers")
                .value_name("N")
                .help("Number of consumer threads; supplying it selects parallel mode")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("feed")
                .long("feed")
                .value_name("KIND")
                .help("Feed locking strategy (coarse, fine)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .get_matches();

    // Load configuration
    let mut config =
        config::load_config_or_default(matches.get_one::<String>("config").map(String::as_str));

    // Apply CLI overrides
    if let Some(&consumers) = matches.get_one::<usize>("consumers") {
        config.mode = Mode::Parallel;
        config.consumers = consumers;
    }
    if let Some(kind) = matches.get_one::<String>("feed") {
        config.feed = kind.parse().map_err(pulsefeed::Error::config)?;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }

    pulsefeed::init(&config.log_level);
    info!("Starting {} v{}", pulsefeed::NAME, pulsefeed::VERSION);

    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout();
    pulsefeed::server::run(&config, stdin, stdout);

    info!("Shutdown complete");
    Ok(())
}
