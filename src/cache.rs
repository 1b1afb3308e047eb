use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};

use crate::models::{CacheSnapshot, Event};
use crate::utils;

/// Snapshot of the last successful scrape on disk. Single writer only; two
/// processes sharing the file may interleave writes.
pub struct EventCache {
    path: PathBuf,
    ttl: Duration,
}

impl EventCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached events when present and fresh (or `ignore_expiry`). Any read
    /// or parse problem counts as a miss.
    pub fn load(&self, ignore_expiry: bool) -> Option<Vec<Event>> {
        self.load_at(utils::now_local(), ignore_expiry)
    }

    pub fn load_at(&self, now: NaiveDateTime, ignore_expiry: bool) -> Option<Vec<Event>> {
        if !self.path.exists() {
            return None;
        }
        let snapshot = match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("error loading cache: {err:#}");
                return None;
            }
        };

        if !ignore_expiry {
            let written = match utils::parse_iso(&snapshot.timestamp) {
                Some(written) => written,
                None => {
                    tracing::warn!("cache timestamp unreadable: {}", snapshot.timestamp);
                    return None;
                }
            };
            let age = now - written;
            if age < Duration::zero() || age > self.ttl {
                tracing::debug!("cache expired ({} minutes old)", age.num_minutes());
                return None;
            }
        }

        if snapshot.events.is_empty() {
            return None;
        }
        Some(snapshot.events)
    }

    /// Overwrites the snapshot; failures are logged and dropped.
    pub fn save(&self, events: &[Event]) {
        let snapshot = CacheSnapshot {
            timestamp: utils::iso(utils::now_local()),
            events: events.to_vec(),
        };
        if let Err(err) = self.write_snapshot(&snapshot) {
            tracing::warn!("error saving cache: {err:#}");
        }
    }

    pub fn write_snapshot(&self, snapshot: &CacheSnapshot) -> Result<()> {
        utils::ensure_parent(&self.path);
        let contents =
            serde_json::to_string_pretty(snapshot).context("unable to serialize cache")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("unable to write cache {}", self.path.display()))
    }

    fn read_snapshot(&self) -> Result<CacheSnapshot> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("unable to read cache {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid cache {}", self.path.display()))
    }
}
