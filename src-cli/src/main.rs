//! cctp - drafting assistant for CCTP construction specifications

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let app = cli::App::parse();

    let default_filter = if app.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    app.run(&config)
}
