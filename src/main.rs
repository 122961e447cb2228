//! tidyblocks - Main Entry Point
//!
//! Runs table pipeline programs over JSON datasets from the command line.

use tidyblocks_rs::cli::{self, Cli};
use tidyblocks_rs::config::DEFAULT_LOG_FILTER;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log to stderr, with `RUST_LOG` taking precedence over `filter`.
fn stderr_logger(filter: &str) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
}

fn main() {
    let cli = Cli::parse_args();

    // Settings pick the log filter, so loading them logs through a default one
    let settings = tracing::subscriber::with_default(stderr_logger(DEFAULT_LOG_FILTER), || {
        cli.settings()
    });
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    stderr_logger(&settings.log_filter).init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = cli::execute(&cli, &settings, &mut out) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
