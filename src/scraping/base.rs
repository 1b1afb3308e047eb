use std::ops::RangeInclusive;
use std::time::Duration;

use chrono::NaiveDateTime;
use md5::{Digest, Md5};
use rand::{Rng, RngCore};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Node};
use thiserror::Error;

use crate::models::Event;
use crate::utils;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

pub const ONLINE_KEYWORDS: [&str; 6] = ["online", "virtual", "remote", "zoom", "meet", "webinar"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http client error: {0}")]
    Client(String),
    #[error("request failed for {url}: {message}")]
    Request { url: String, message: String },
    #[error("non-success status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("unable to read response body for {url}: {message}")]
    Body { url: String, message: String },
}

pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking GET with browser-like headers and no retry.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(|err| FetchError::Body {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

/// Per-page state shared by the extraction strategies.
pub struct ExtractContext<'a> {
    pub page_url: &'a str,
    /// Where the parsed HTML was fetched from; relative links resolve here.
    pub document_url: &'a str,
    pub default_image: &'a str,
    pub now: NaiveDateTime,
    pub rng: &'a mut dyn RngCore,
}

/// How missing fields are filled in for heuristically found events.
pub struct SynthesisPolicy {
    pub day_offset: RangeInclusive<i64>,
    pub duration_hours: i64,
    pub attendees: RangeInclusive<u32>,
    pub location: &'static str,
}

pub struct Candidate {
    pub id_source: String,
    pub name: String,
    pub description: String,
    pub event_url: String,
}

pub fn synthesize_event(
    ctx: &mut ExtractContext<'_>,
    policy: &SynthesisPolicy,
    candidate: Candidate,
) -> Event {
    let days = ctx.rng.gen_range(policy.day_offset.clone());
    let start = ctx.now + chrono::Duration::days(days);
    let end = start + chrono::Duration::hours(policy.duration_hours);
    let attendee_count = ctx.rng.gen_range(policy.attendees.clone());
    let is_online = ctx.rng.gen_bool(0.5);

    Event {
        id: generate_id(&candidate.id_source),
        name: candidate.name,
        description: candidate.description,
        start_time: utils::iso(start),
        end_time: utils::iso(end),
        location: policy.location.to_string(),
        image_url: ctx.default_image.to_string(),
        attendee_count,
        is_online,
        event_url: candidate.event_url,
        created_time: utils::iso(ctx.now),
    }
}

/// First 12 hex characters of the MD5 of `name`, byte-exact.
pub fn generate_id(name: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("")
}

/// Text of the element's direct text children only.
pub fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

pub fn absolute_url(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(href).ok().map(|u| u.to_string())
}

/// Upper-cases the first cased character of every word and lower-cases the
/// rest; a word starts after any non-alphabetic character.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_cased = false;
    for ch in input.chars() {
        if prev_cased {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_cased = ch.is_alphabetic();
    }
    out
}

pub fn truncate_chars(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

pub fn mentions_online(haystack: &str) -> bool {
    let lower = haystack.to_lowercase();
    ONLINE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
