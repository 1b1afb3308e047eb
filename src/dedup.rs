use std::collections::HashSet;

use crate::models::Event;

/// Keeps the first event for each [`Event::dedup_key`], preserving order.
pub fn deduplicate(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| seen.insert(event.dedup_key()))
        .collect()
}

/// Ascending by raw `start_time` text; stable for equal values.
pub fn sort_by_start(events: &mut [Event]) {
    events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
}

pub fn dedupe_and_sort(events: Vec<Event>) -> Vec<Event> {
    let mut unique = deduplicate(events);
    sort_by_start(&mut unique);
    unique
}
