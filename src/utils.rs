use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use dirs::config_dir;
use std::{fs, path::Path, path::PathBuf};

pub fn config_root() -> PathBuf {
    let base = config_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("events-scrape")
}

pub fn config_path() -> PathBuf {
    config_root().join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return;
        }
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!("failed to create parent {:?}: {err}", parent);
        }
    }
}

/// Wall-clock time as a naive local timestamp.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// ISO-8601 without offset; microseconds only when non-zero.
pub fn iso(dt: NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Accepts the naive form written by [`iso`] as well as RFC 3339 text with an
/// offset, which is converted to local time.
pub fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Local).naive_local())
}
