use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils;

const DEFAULT_PAGE_URL: &str = "https://www.facebook.com/0thealgorithm";
const DEFAULT_CACHE_FILE: &str = "events_cache.json";
const DEFAULT_IMAGE: &str = "images/algorithm_logo.png";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScraperConfig {
    pub page_url: String,
    pub cache_file: PathBuf,
    pub cache_ttl_minutes: i64,
    pub request_timeout_secs: u64,
    pub politeness_delay_ms: DelayRange,
    pub serve_port: u16,
    pub serve_root: PathBuf,
    pub default_image: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            cache_ttl_minutes: 30,
            request_timeout_secs: 15,
            politeness_delay_ms: DelayRange {
                min: 2000,
                max: 4000,
            },
            serve_port: 8080,
            serve_root: PathBuf::from("."),
            default_image: DEFAULT_IMAGE.to_string(),
        }
    }
}

impl ScraperConfig {
    /// Reads the JSON config (explicit path, else the per-user default) and
    /// applies environment overrides on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(utils::config_path);
        let mut config = read_config(&path)?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("EVENTS_PAGE_URL") {
            if !url.trim().is_empty() {
                self.page_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("EVENTS_CACHE_FILE") {
            if !path.trim().is_empty() {
                self.cache_file = PathBuf::from(path.trim());
            }
        }
        if let Some(port) = std::env::var("EVENTS_SERVE_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.serve_port = port;
        }
    }
}

fn read_config(path: &Path) -> Result<ScraperConfig> {
    if !path.exists() {
        return Ok(ScraperConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))
}
