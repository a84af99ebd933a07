use anyhow::{Context, Result};
use dotenvy::dotenv;
use listing_collector::{CollectorConfig, DelayRange};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATA_PATH: &str = "carlist_data.csv";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub data_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut collector = CollectorConfig::default();

        if let Some(url) = lookup("CARLIST_BASE_URL") {
            collector = collector.with_base_url(url);
        }
        if let Some(pages) = parse_var::<u32>(&lookup, "CARLIST_MAX_PAGES")? {
            collector = collector.with_max_pages(pages);
        }
        if let Some(headless) = parse_var::<bool>(&lookup, "CARLIST_HEADLESS")? {
            collector = collector.with_headless(headless);
        }
        if let Some(agents) = lookup("CARLIST_USER_AGENTS") {
            let agents: Vec<String> = agents
                .split('|')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            collector = collector.with_user_agents(agents);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CARLIST_PAGE_WAIT_SECS")? {
            collector = collector.with_page_wait(Duration::from_secs(secs));
        }

        let delay_min = parse_var::<u64>(&lookup, "CARLIST_DELAY_MIN_MS")?;
        let delay_max = parse_var::<u64>(&lookup, "CARLIST_DELAY_MAX_MS")?;
        if delay_min.is_some() || delay_max.is_some() {
            let current = collector.delay;
            collector = collector.with_delay(DelayRange::new(
                delay_min.map(Duration::from_millis).unwrap_or(current.min),
                delay_max.map(Duration::from_millis).unwrap_or(current.max),
            ));
        }

        Ok(Self {
            collector,
            data_path: lookup("CARLIST_DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
            artifacts_dir: lookup("CARLIST_ARTIFACTS_DIR")
                .unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.to_string())
                .into(),
            port: parse_var::<u16>(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a valid {}", key, std::any::type_name::<T>()))
        })
        .transpose()
}
