//! Configuration types for a collection run.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CollectError, CollectResult};

/// Default results page template; the page number is appended.
pub const DEFAULT_BASE_URL: &str = "https://www.carlist.my/cars-for-sale/malaysia?page=";

/// Default page ceiling.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Browser user agents rotated across requests.
pub const DEFAULT_USER_AGENTS: [&str; 2] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Configuration for a listing crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// URL template; the 1-based page number is appended verbatim.
    pub base_url: String,

    /// Maximum number of pages to visit. Default: 50.
    pub max_pages: u32,

    /// Run the page source without a visible window.
    ///
    /// Plain HTTP sources are always headless; the flag is carried for
    /// sources that drive a real browser.
    pub headless: bool,

    /// User agents to rotate through. Must not be empty.
    pub user_agents: Vec<String>,

    /// How long to wait for a page's listings before treating the page
    /// as the end of results. Default: 10 seconds.
    #[serde(with = "duration_millis")]
    pub page_wait: Duration,

    /// Randomized pause between pages.
    pub delay: DelayRange,

    /// CSS selectors for the listing container and its fields.
    pub selectors: ListingSelectors,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            headless: true,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            page_wait: Duration::from_secs(10),
            delay: DelayRange::default(),
            selectors: ListingSelectors::default(),
        }
    }
}

impl CollectorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL template.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the page ceiling.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Toggle headless mode.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Replace the user-agent pool.
    pub fn with_user_agents(mut self, agents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.user_agents = agents.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Set the per-page wait timeout.
    pub fn with_page_wait(mut self, wait: Duration) -> Self {
        self.page_wait = wait;
        self
    }

    /// Set the inter-page delay range.
    pub fn with_delay(mut self, delay: DelayRange) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the CSS selectors.
    pub fn with_selectors(mut self, selectors: ListingSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// URL of the given 1-based page.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}", self.base_url, page)
    }

    /// Reject configurations the crawl loop cannot honour.
    pub fn validate(&self) -> CollectResult<()> {
        if self.max_pages == 0 {
            return Err(CollectError::config("max_pages must be at least 1"));
        }
        if self.user_agents.iter().all(|a| a.trim().is_empty()) {
            return Err(CollectError::config("user agent pool must not be empty"));
        }
        if self.delay.min > self.delay.max {
            return Err(CollectError::config(format!(
                "delay range is inverted: {:?} > {:?}",
                self.delay.min, self.delay.max
            )));
        }
        let first = self.page_url(1);
        url::Url::parse(&first).map_err(|_| CollectError::InvalidUrl { url: first })?;
        Ok(())
    }
}

/// Bounded jitter between page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    #[serde(with = "duration_millis")]
    pub min: Duration,
    #[serde(with = "duration_millis")]
    pub max: Duration,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(3),
        }
    }
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// No pause at all (tests, local fixtures).
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Draw a delay uniformly from `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

/// CSS selectors locating a listing card and its five fields.
///
/// Field selectors are evaluated relative to the card element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    pub container: String,
    pub name: String,
    pub price: String,
    pub mileage: String,
    pub transmission: String,
    pub location: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container: ".listing".to_string(),
            name: ".listing__title".to_string(),
            price: ".listing__price".to_string(),
            mileage: ".listing__specs div:first-child".to_string(),
            transmission: ".listing__specs div:nth-child(2)".to_string(),
            location: ".listing__specs div:nth-child(4)".to_string(),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn page_url_appends_page_number() {
        let config = CollectorConfig::new();
        assert_eq!(
            config.page_url(3),
            "https://www.carlist.my/cars-for-sale/malaysia?page=3"
        );
    }

    #[test]
    fn validate_rejects_empty_agent_pool() {
        let config = CollectorConfig::new().with_user_agents(Vec::<String>::new());
        assert!(matches!(config.validate(), Err(CollectError::Config { .. })));
    }

    #[test]
    fn validate_rejects_zero_page_ceiling() {
        let config = CollectorConfig::new().with_max_pages(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unparseable_template() {
        let config = CollectorConfig::new().with_base_url("not a url ");
        assert!(matches!(
            config.validate(),
            Err(CollectError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn delay_sample_stays_within_bounds() {
        let range = DelayRange::new(Duration::from_millis(1000), Duration::from_millis(3000));
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let d = range.sample(&mut rng);
            assert!(d >= range.min && d <= range.max, "{:?} out of range", d);
        }
        assert_eq!(DelayRange::none().sample(&mut rng), Duration::ZERO);
    }
}
