pub mod cache;
mod cli;
pub mod config;
pub mod dedup;
pub mod export;
pub mod fallback;
pub mod models;
pub mod orchestrator;
pub mod scraping;
pub mod server;
mod utils;

use clap::Parser;
use tracing::info;

pub use cache::EventCache;
pub use config::ScraperConfig;
pub use models::Event;
pub use orchestrator::EventScraper;
pub use scraping::base::{generate_id, FetchError, PageFetcher};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let cli = cli::Cli::parse();
    let config = ScraperConfig::load(cli.config.as_deref())?;

    if cli.serve {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        return runtime.block_on(server::serve(config, cli.refresh));
    }

    let mut scraper = EventScraper::from_config(config)?;
    let count = export::export_to_json(&mut scraper, &cli.export, cli.refresh)?;
    info!("exported {count} events to {}", cli.export.display());
    Ok(())
}
