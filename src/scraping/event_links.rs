use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::base::{self, Candidate, ExtractContext, SynthesisPolicy};
use super::ExtractionStrategy;
use crate::models::Event;

const POLICY: SynthesisPolicy = SynthesisPolicy {
    day_offset: 1..=30,
    duration_hours: 2,
    attendees: 20..=100,
    location: "TBD",
};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));
static EVENT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/events/\d+").expect("event path regex"));

/// Anchors pointing at individual event pages.
pub struct EventLinks;

impl ExtractionStrategy for EventLinks {
    fn name(&self) -> &'static str {
        "event_links"
    }

    fn extract(&self, document: &Html, ctx: &mut ExtractContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        for link in document.select(&LINK_SELECTOR) {
            let href = match link.value().attr("href") {
                Some(href) if EVENT_PATH_RE.is_match(href) => href,
                _ => continue,
            };
            let raw = base::inner_text(link);
            let text = raw.trim();
            if text.chars().count() <= 5 {
                continue;
            }
            let event_url = match base::absolute_url(ctx.document_url, href) {
                Some(url) => url,
                None => continue,
            };
            let candidate = Candidate {
                id_source: text.to_string(),
                description: format!("Event from Facebook page: {text}"),
                name: text.to_string(),
                event_url,
            };
            events.push(base::synthesize_event(ctx, &POLICY, candidate));
        }
        events
    }
}
