use anyhow::Result;
use clap::Parser;
use log::info;

use channel_lister::cli::{self, Cli};
use channel_lister::settings::Settings;

const LOG_FILE: &str = "channel-lister.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file, truncated on each run
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_FILE)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!("Starting channel-lister {}", env!("CARGO_PKG_VERSION"));

    cli::run(cli, settings).await
}
