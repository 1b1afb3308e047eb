use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: String, // md5(name)[..12]
    pub name: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub image_url: String,
    pub attendee_count: u32,
    pub is_online: bool,
    pub event_url: String,
    pub created_time: String,
}

impl Event {
    /// Identity used by the deduplicator: lower-cased trimmed name plus the
    /// calendar-date prefix of `start_time`.
    pub fn dedup_key(&self) -> String {
        let date: String = self.start_time.chars().take(10).collect();
        format!("{}_{}", self.name.trim().to_lowercase(), date)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CacheSnapshot {
    pub timestamp: String,
    pub events: Vec<Event>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExportDocument {
    pub last_updated: String,
    pub events: Vec<Event>,
    pub total_count: usize,
    pub source: String,
}

/// Body served by the local events endpoints.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventFeed {
    pub last_updated: String,
    pub events: Vec<Event>,
    pub total_count: usize,
}
