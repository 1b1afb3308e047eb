use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{info, warn};

use crate::cache::EventCache;
use crate::config::{DelayRange, ScraperConfig};
use crate::dedup;
use crate::fallback;
use crate::models::Event;
use crate::scraping::base::{ExtractContext, FetchError, HttpFetcher, PageFetcher};
use crate::scraping;
use crate::utils;

/// Cache, then live scrape, then stale cache, then the curated list.
pub struct EventScraper<F: PageFetcher> {
    config: ScraperConfig,
    fetcher: F,
    cache: EventCache,
    rng: Box<dyn RngCore + Send>,
}

impl EventScraper<HttpFetcher> {
    pub fn from_config(config: ScraperConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: PageFetcher> EventScraper<F> {
    pub fn new(config: ScraperConfig, fetcher: F) -> Self {
        let cache = EventCache::new(
            config.cache_file.clone(),
            chrono::Duration::minutes(config.cache_ttl_minutes),
        );
        Self {
            config,
            fetcher,
            cache,
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Never fails: the lowest tier is the curated fallback list.
    pub fn get_events(&mut self, force_refresh: bool) -> Vec<Event> {
        if !force_refresh {
            if let Some(cached) = self.cache.load(false) {
                info!("loaded {} events from cache", cached.len());
                return cached;
            }
        }

        info!("fetching events from {}", self.config.page_url);
        match self.scrape() {
            Ok(events) if !events.is_empty() => {
                self.cache.save(&events);
                info!("successfully fetched {} events", events.len());
                events
            }
            Ok(_) => {
                warn!("no events found, using fallback data");
                self.fallback()
            }
            Err(err) => {
                warn!("error fetching events: {err:#}");
                match self.cache.load(true) {
                    Some(stale) => {
                        info!("using expired cache with {} events", stale.len());
                        stale
                    }
                    None => {
                        info!("using fallback events");
                        self.fallback()
                    }
                }
            }
        }
    }

    /// Fetches the page (and its events listing when linked), extracts,
    /// deduplicates and sorts. Any fetch failure aborts the whole run.
    pub fn scrape(&mut self) -> Result<Vec<Event>> {
        let now = utils::now_local();
        let page_url = self.config.page_url.clone();
        tracing::debug!("strategies: {:?}", scraping::strategy_names());

        let html = self.fetcher.fetch(&page_url)?;
        let mut events = self.extract(&html, &page_url, now);
        if !events.is_empty() {
            info!("found {} events on main page", events.len());
        }

        if let Some(link) = scraping::find_events_page_link(&html, &page_url) {
            info!("found events page: {link}");
            let wait = politeness_wait(self.config.politeness_delay_ms, &mut *self.rng);
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
            let listing = self.fetcher.fetch(&link)?;
            let mut more = self.extract(&listing, &link, now);
            if !more.is_empty() {
                info!("found {} additional events on events page", more.len());
            }
            events.append(&mut more);
        }

        Ok(dedup::dedupe_and_sort(events))
    }

    fn extract(&mut self, html: &str, document_url: &str, now: NaiveDateTime) -> Vec<Event> {
        let mut ctx = ExtractContext {
            page_url: &self.config.page_url,
            document_url,
            default_image: &self.config.default_image,
            now,
            rng: &mut *self.rng,
        };
        scraping::extract_page(html, &mut ctx)
    }

    fn fallback(&self) -> Vec<Event> {
        fallback::fallback_events(utils::now_local(), &self.config.page_url)
    }
}

/// Pause before the events listing request, drawn uniformly from `range`.
fn politeness_wait(range: DelayRange, rng: &mut dyn RngCore) -> Duration {
    let (low, high) = (range.min.min(range.max), range.min.max(range.max));
    Duration::from_millis(rng.gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const PAGE: &str = "https://www.facebook.com/0thealgorithm";
    const LISTING: &str = "https://www.facebook.com/0thealgorithm/events";

    const MAIN_HTML: &str = r#"
    <html><head>
    <script type="application/ld+json">
    {"@type": "Event", "name": "Rust Meetup", "startDate": "2030-05-10T18:00:00",
     "endDate": "2030-05-10T20:00:00", "location": {"name": "Tech Hub"}, "attendeeCount": 40}
    </script>
    </head><body>
    <a href="/0thealgorithm/events">Events</a>
    </body></html>
    "#;

    const LISTING_HTML: &str = r#"
    <html><head>
    <script type="application/ld+json">
    [{"@type": "Event", "name": "rust meetup ", "startDate": "2030-05-10T09:00:00"},
     {"@type": "Event", "name": "Graph Night", "startDate": "2030-04-01T18:00:00"}]
    </script>
    </head><body></body></html>
    "#;

    struct ScriptedFetcher {
        pages: HashMap<String, Result<String, u16>>,
        requested: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(pages: &[(&str, Result<&str, u16>)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, page)| (url.to_string(), page.map(str::to_string)))
                    .collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Request {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> ScraperConfig {
        ScraperConfig {
            cache_file: dir.path().join("events_cache.json"),
            politeness_delay_ms: DelayRange { min: 0, max: 0 },
            ..ScraperConfig::default()
        }
    }

    fn scraper(
        dir: &tempfile::TempDir,
        pages: &[(&str, Result<&str, u16>)],
    ) -> EventScraper<ScriptedFetcher> {
        EventScraper::new(config_in(dir), ScriptedFetcher::new(pages))
            .with_rng(StdRng::seed_from_u64(4))
    }

    #[test]
    fn merges_listing_page_and_dedupes_across_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scraper = scraper(&dir, &[(PAGE, Ok(MAIN_HTML)), (LISTING, Ok(LISTING_HTML))]);
        let events = scraper.get_events(false);

        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Graph Night", "Rust Meetup"]);
        assert_eq!(events[1].location, "Tech Hub");
        assert_eq!(events[1].attendee_count, 40);
        assert_eq!(
            *scraper.fetcher().requested.borrow(),
            vec![PAGE.to_string(), LISTING.to_string()]
        );
        assert_eq!(scraper.cache().load(false), Some(events));
    }

    #[test]
    fn empty_extraction_returns_fallback_without_caching() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scraper = scraper(&dir, &[(PAGE, Ok("<html><body><p>Hello</p></body></html>"))]);
        let events = scraper.get_events(false);
        assert_eq!(events.len(), 9);
        assert_eq!(events[0].name, "Software Fellowship 2.0");
        assert!(!scraper.cache().path().exists());
    }

    #[test]
    fn fetch_error_prefers_stale_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut seeded = scraper(&dir, &[(PAGE, Ok(MAIN_HTML)), (LISTING, Ok(LISTING_HTML))]);
        let live = seeded.get_events(true);

        let mut offline = scraper(&dir, &[(PAGE, Err(503))]);
        assert_eq!(offline.get_events(true), live);
    }

    #[test]
    fn listing_failure_aborts_the_live_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scraper = scraper(&dir, &[(PAGE, Ok(MAIN_HTML)), (LISTING, Err(500))]);
        assert!(scraper.scrape().is_err());

        let events = scraper.get_events(false);
        assert_eq!(events.len(), 9);
        assert!(!scraper.cache().path().exists());
    }

    #[test]
    fn forced_refresh_skips_fresh_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut scraper = scraper(&dir, &[(PAGE, Ok(MAIN_HTML)), (LISTING, Ok(LISTING_HTML))]);
        scraper.get_events(false);
        scraper.get_events(false);
        assert_eq!(scraper.fetcher().requested.borrow().len(), 2);

        scraper.get_events(true);
        assert_eq!(scraper.fetcher().requested.borrow().len(), 4);
    }

    #[test]
    fn listing_links_resolve_against_the_listing_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let listing = "https://www.facebook.com/0thealgorithm/events/";
        let mut scraper = scraper(
            &dir,
            &[
                (PAGE, Ok(r#"<a href="/0thealgorithm/events/">Events</a>"#)),
                (listing, Ok(r#"<a href="past/events/42">Open Data Hackathon</a>"#)),
            ],
        );
        let events = scraper.scrape().expect("scrape");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].event_url,
            "https://www.facebook.com/0thealgorithm/events/past/events/42"
        );
    }

    #[test]
    fn default_politeness_wait_is_two_to_four_seconds() {
        let range = ScraperConfig::default().politeness_delay_ms;
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let wait = politeness_wait(range, &mut rng);
            assert!(
                (Duration::from_millis(2000)..=Duration::from_millis(4000)).contains(&wait),
                "wait {wait:?}"
            );
        }
        assert_eq!(
            politeness_wait(DelayRange { min: 500, max: 500 }, &mut rng),
            Duration::from_millis(500)
        );
        let swapped = politeness_wait(DelayRange { min: 300, max: 100 }, &mut rng);
        assert!((Duration::from_millis(100)..=Duration::from_millis(300)).contains(&swapped));
    }
}
