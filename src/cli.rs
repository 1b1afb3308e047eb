use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "events-scrape",
    about = "Scrape community events from a Facebook page"
)]
pub struct Cli {
    /// Ignore a fresh cache and scrape again
    #[arg(long)]
    pub refresh: bool,

    /// Export filename
    #[arg(long, default_value = "events.json")]
    pub export: PathBuf,

    /// Serve the events API with CORS headers instead of exporting
    #[arg(long)]
    pub serve: bool,

    /// JSON config file (defaults to the per-user config location)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
