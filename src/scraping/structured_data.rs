use once_cell::sync::Lazy;
use rand::Rng;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use thiserror::Error;

use super::base::{self, ExtractContext};
use super::ExtractionStrategy;
use crate::models::Event;
use crate::utils;

const LOCATION_TBD: &str = "Location TBD";
const UNKNOWN_NAME: &str = "Unknown Event";
const CAPACITY_FIELDS: [&str; 3] = ["attendeeCount", "maximumAttendeeCapacity", "totalCapacity"];

static LD_JSON_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector")
});

#[derive(Debug, Error, PartialEq)]
pub enum StructuredDataError {
    #[error("structured data item is not an object")]
    NotAnObject,
    #[error("structured data type is not an event")]
    NotAnEvent,
    #[error("field `{0}` has an unexpected type")]
    FieldType(&'static str),
}

/// Maps JSON-LD `Event` objects embedded in the page.
pub struct StructuredData;

impl ExtractionStrategy for StructuredData {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn extract(&self, document: &Html, ctx: &mut ExtractContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        for script in document.select(&LD_JSON_SELECTOR) {
            let raw = base::inner_text(script);
            let data: Value = match serde_json::from_str(raw.trim()) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!("skipping unparseable ld+json block: {err}");
                    continue;
                }
            };
            for item in flatten_items(&data) {
                match parse_structured_event(item, ctx) {
                    Ok(event) => events.push(event),
                    Err(err) => tracing::debug!("skipping structured item: {err}"),
                }
            }
        }
        events
    }
}

fn flatten_items(data: &Value) -> Vec<&Value> {
    match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(graph)) => graph.iter().collect(),
            _ => vec![data],
        },
        other => vec![other],
    }
}

pub fn parse_structured_event(
    data: &Value,
    ctx: &mut ExtractContext<'_>,
) -> Result<Event, StructuredDataError> {
    let object = data.as_object().ok_or(StructuredDataError::NotAnObject)?;
    if !declares_event_type(object)? {
        return Err(StructuredDataError::NotAnEvent);
    }

    let name = string_field(object, "name")?.unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let description = string_field(object, "description")?.unwrap_or_default();
    let start_time = string_field(object, "startDate")?.unwrap_or_default();
    let end_time = string_field(object, "endDate")?.unwrap_or_default();
    let event_url = string_field(object, "url")?.unwrap_or_else(|| ctx.page_url.to_string());
    let image_url = image_field(object).unwrap_or_else(|| ctx.default_image.to_string());

    let attendee_count = match capacity(object) {
        Some(count) => count,
        None => ctx.rng.gen_range(20..=100),
    };

    Ok(Event {
        id: base::generate_id(&name),
        name,
        description,
        start_time,
        end_time,
        location: location_name(object),
        image_url,
        attendee_count,
        is_online: is_online(object),
        event_url,
        created_time: utils::iso(ctx.now),
    })
}

fn declares_event_type(object: &Map<String, Value>) -> Result<bool, StructuredDataError> {
    match object.get("@type") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::String(kind)) => Ok(kind.to_lowercase().contains("event")),
        Some(Value::Array(kinds)) => Ok(kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| kind.to_lowercase().contains("event"))),
        Some(_) => Err(StructuredDataError::FieldType("@type")),
    }
}

fn string_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, StructuredDataError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(StructuredDataError::FieldType(field)),
    }
}

fn image_field(object: &Map<String, Value>) -> Option<String> {
    match object.get("image")? {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(url) => Some(url.clone()),
            Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn location_name(object: &Map<String, Value>) -> String {
    match object.get("location") {
        None => LOCATION_TBD.to_string(),
        Some(Value::Object(place)) => match place.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => LOCATION_TBD.to_string(),
        },
        Some(Value::String(text)) => text.clone(),
        Some(_) => LOCATION_TBD.to_string(),
    }
}

fn capacity(object: &Map<String, Value>) -> Option<u32> {
    CAPACITY_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(coerce_count)
}

fn coerce_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                u32::try_from(int).ok()
            } else {
                number
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && *f <= f64::from(u32::MAX))
                    .map(|f| f.trunc() as u32)
            }
        }
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn is_online(object: &Map<String, Value>) -> bool {
    ["location", "eventAttendanceMode"]
        .iter()
        .filter_map(|field| object.get(*field))
        .any(|value| {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            base::mentions_online(&text)
        })
}
