use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{Event, ExportDocument};
use crate::orchestrator::EventScraper;
use crate::scraping::base::PageFetcher;
use crate::utils;

pub const EXPORT_SOURCE: &str = "facebook_scraper";

pub fn export_document(events: Vec<Event>) -> ExportDocument {
    ExportDocument {
        last_updated: utils::iso(utils::now_local()),
        total_count: events.len(),
        events,
        source: EXPORT_SOURCE.to_string(),
    }
}

/// Writes the current event list for the website; returns how many events
/// were exported.
pub fn export_to_json<F: PageFetcher>(
    scraper: &mut EventScraper<F>,
    path: &Path,
    force_refresh: bool,
) -> Result<usize> {
    let document = export_document(scraper.get_events(force_refresh));
    utils::ensure_parent(path);
    let contents =
        serde_json::to_string_pretty(&document).context("unable to serialize export")?;
    fs::write(path, contents)
        .with_context(|| format!("error exporting events to {}", path.display()))?;
    Ok(document.total_count)
}
