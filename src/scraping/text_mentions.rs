use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::base::{self, Candidate, ExtractContext, SynthesisPolicy};
use super::ExtractionStrategy;
use crate::models::Event;

const DESCRIPTION_LABEL: &str = "Event mentioned in Facebook post: ";
const DESCRIPTION_LIMIT: usize = 200;

const POLICY: SynthesisPolicy = SynthesisPolicy {
    day_offset: 7..=45,
    duration_hours: 3,
    attendees: 15..=80,
    location: "Location TBD",
};

static TEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, div, span").expect("text element selector"));
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(workshop|hackathon|meetup|conference|seminar|training|bootcamp|session|talk|event)",
    )
    .expect("event keyword regex")
});
static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\w+\s+workshop|hackathon|meetup|conference|seminar)\s*(?:on|-)?\s*(\w+\s+\d{1,2})",
        r"(?i)(\w+(?:\s+\w+)*)\s*-\s*(\w+\s+\d{1,2})",
        r"(?i)join us for\s+(\w+(?:\s+\w+)*)",
        r"(?i)upcoming\s+(\w+(?:\s+\w+)*)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("event name pattern"))
    .collect()
});

/// Finds events mentioned in post text.
pub struct TextMentions;

impl ExtractionStrategy for TextMentions {
    fn name(&self) -> &'static str {
        "text_mentions"
    }

    fn extract(&self, document: &Html, ctx: &mut ExtractContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        for element in document.select(&TEXT_SELECTOR) {
            if !KEYWORD_RE.is_match(&base::own_text(element)) {
                continue;
            }
            let text = base::inner_text(element);
            if let Some(event) = parse_event_from_text(&text, ctx) {
                events.push(event);
            }
        }
        events
    }
}

/// Returns the first name captured by the patterns, in order, that is longer
/// than three characters.
pub fn extract_name(text: &str) -> Option<String> {
    NAME_PATTERNS.iter().find_map(|pattern| {
        let name = pattern.captures(text)?.get(1)?.as_str().trim();
        (name.chars().count() > 3).then(|| name.to_string())
    })
}

pub fn parse_event_from_text(text: &str, ctx: &mut ExtractContext<'_>) -> Option<Event> {
    let raw_name = extract_name(text)?;
    let description = format!(
        "{DESCRIPTION_LABEL}{}...",
        base::truncate_chars(text, DESCRIPTION_LIMIT)
    );
    let candidate = Candidate {
        name: base::title_case(&raw_name),
        id_source: raw_name,
        description,
        event_url: ctx.page_url.to_string(),
    };
    Some(base::synthesize_event(ctx, &POLICY, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use chrono::{NaiveDate, NaiveDateTime};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PAGE: &str = "https://www.facebook.com/0thealgorithm";

    const SAMPLE_HTML: &str = r#"
    <div class="feed">
        <div class="post">
            <p>Join us for Data Science Bootcamp this weekend!</p>
        </div>
        <div>Python workshop on March 15</div>
        <span>Hackathon - June 3</span>
        <p>Session upcoming xyz</p>
        <p>Nothing to see here</p>
    </div>
    "#;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid now")
    }

    fn run(seed: u64) -> Vec<Event> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = ExtractContext {
            page_url: PAGE,
            document_url: PAGE,
            default_image: "images/algorithm_logo.png",
            now: now(),
            rng: &mut rng,
        };
        TextMentions.extract(&Html::parse_document(SAMPLE_HTML), &mut ctx)
    }

    #[test]
    fn extracts_named_mentions() {
        let events = run(3);
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Data Science Bootcamp This Weekend",
                "Python Workshop",
                "Hackathon"
            ]
        );

        let bootcamp = &events[0];
        assert_eq!(
            bootcamp.id,
            base::generate_id("Data Science Bootcamp this weekend")
        );
        assert_eq!(
            bootcamp.description,
            "Event mentioned in Facebook post: Join us for Data Science Bootcamp this weekend!..."
        );
        assert_eq!(bootcamp.location, "Location TBD");
        assert_eq!(bootcamp.event_url, PAGE);
    }

    #[test]
    fn synthesized_fields_follow_policy() {
        for event in run(11) {
            let start = utils::parse_iso(&event.start_time).expect("start");
            let end = utils::parse_iso(&event.end_time).expect("end");
            let days = (start - now()).num_days();
            assert!((7..=45).contains(&days), "offset {days}");
            assert_eq!((end - start).num_hours(), 3);
            assert!((15..=80).contains(&event.attendee_count));
            assert_eq!(event.created_time, "2025-02-01T12:00:00");
        }
    }

    #[test]
    fn same_seed_same_events() {
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn short_names_fall_through_to_later_patterns() {
        assert_eq!(extract_name("upcoming fun"), None);
        assert_eq!(
            extract_name("Big - day 1 and upcoming robotics seminar").as_deref(),
            Some("robotics seminar")
        );
        assert_eq!(
            extract_name("AI - Jan 5, join us for Deep Learning").as_deref(),
            Some("Deep Learning")
        );
    }

    #[test]
    fn names_keep_the_source_whitespace() {
        let html = "<p>Join us for Data  Science\n  workshop</p>";
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = ExtractContext {
            page_url: PAGE,
            document_url: PAGE,
            default_image: "images/algorithm_logo.png",
            now: now(),
            rng: &mut rng,
        };
        let events = TextMentions.extract(&Html::parse_document(html), &mut ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, base::generate_id("Data  Science\n  workshop"));
        assert_eq!(events[0].name, "Data  Science\n  Workshop");
        assert_eq!(
            events[0].description,
            "Event mentioned in Facebook post: Join us for Data  Science\n  workshop..."
        );
    }

    #[test]
    fn wrapper_elements_without_own_text_are_not_candidates() {
        let html = "<div><p>Join us for Graph Night, our monthly event</p></div>";
        let mut rng = StdRng::seed_from_u64(8);
        let mut ctx = ExtractContext {
            page_url: PAGE,
            document_url: PAGE,
            default_image: "images/algorithm_logo.png",
            now: now(),
            rng: &mut rng,
        };
        let events = TextMentions.extract(&Html::parse_document(html), &mut ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Graph Night");
    }

    #[test]
    fn long_text_is_truncated_in_description() {
        let text = format!("Join us for Graph Theory {}", "x".repeat(300));
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = ExtractContext {
            page_url: PAGE,
            document_url: PAGE,
            default_image: "images/algorithm_logo.png",
            now: now(),
            rng: &mut rng,
        };
        let event = parse_event_from_text(&text, &mut ctx).expect("event");
        let body = event
            .description
            .strip_prefix(DESCRIPTION_LABEL)
            .and_then(|rest| rest.strip_suffix("..."))
            .expect("labelled description");
        assert_eq!(body.chars().count(), 200);
    }
}
