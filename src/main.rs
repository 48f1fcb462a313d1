//! Transient Store - command-line entry point
//!
//! One-shot commands (`get`, `set`, `update`, `delete`, `clean`) run against
//! the option table file and exit; `serve` keeps running as an HTTP server.

use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transient_store::cli::{execute, Cli, Commands, Console};
use transient_store::options::FileOptions;
use transient_store::{server, Config, Transients};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Defaults to warnings only for one-shot commands and info for the server;
    // RUST_LOG overrides either.
    let default_filter = match (&cli.command, cli.verbose) {
        (_, true) => "transient_store=debug,tower_http=debug",
        (Commands::Serve { .. }, false) => "transient_store=info,tower_http=info",
        _ => "transient_store=warn",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Commands::Serve { port: Some(port) } = &cli.command {
        config.server_port = *port;
    }
    debug!(?config, "Configuration loaded");

    let options = Arc::new(FileOptions::open(&config.db_path)?);
    let transients = Transients::from_config(&config, options);

    if let Commands::Serve { .. } = &cli.command {
        return server::serve(&config, transients).await;
    }

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let mut console = Console::new(&mut stdout, &mut stderr);
    execute(&cli.command, &transients, &mut console)
}
