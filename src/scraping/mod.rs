pub mod base;
pub mod event_links;
pub mod structured_data;
pub mod text_mentions;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::models::Event;
use base::ExtractContext;

/// One best-effort heuristic over a parsed page. Implementations return an
/// empty list rather than failing.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, document: &Html, ctx: &mut ExtractContext<'_>) -> Vec<Event>;
}

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));

fn active_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(structured_data::StructuredData),
        Box::new(text_mentions::TextMentions),
        Box::new(event_links::EventLinks),
    ]
}

pub fn strategy_names() -> Vec<&'static str> {
    active_strategies()
        .iter()
        .map(|strategy| strategy.name())
        .collect()
}

/// Runs every strategy over the page and concatenates their candidates in
/// strategy order.
pub fn extract_page(html: &str, ctx: &mut ExtractContext<'_>) -> Vec<Event> {
    let document = Html::parse_document(html);
    let mut events = Vec::new();
    for strategy in active_strategies() {
        let mut found = strategy.extract(&document, ctx);
        tracing::debug!("{} found {} candidates", strategy.name(), found.len());
        events.append(&mut found);
    }
    events
}

/// First link to an events listing, if it stays on the page's site.
pub fn find_events_page_link(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let site = site_domain(page_url);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter(|href| href.contains("/events"))
        .find_map(|href| {
            if href.starts_with('/') {
                return base::absolute_url(page_url, href);
            }
            match &site {
                Some(domain) if href.contains(domain.as_str()) => Some(href.to_string()),
                _ => None,
            }
        })
}

fn site_domain(page_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(page_url).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
