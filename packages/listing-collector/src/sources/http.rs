//! HTTP page source - plain reqwest fetches with browser-like headers
//!
//! This implementation:
//! - Uses reqwest for HTTP requests
//! - Rotates the configured user agents, one random pick per request
//! - Sends the headers a desktop browser would send
//!
//! Limitations:
//! - No JavaScript rendering (listing markup must be in the served HTML)

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{CollectError, CollectResult};
use crate::traits::PageSource;
use crate::types::CollectorConfig;

/// Grace added to the page wait for the HTTP client's own timeout.
const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(1);

fn client_timeout(page_wait: Duration) -> Duration {
    page_wait + CLIENT_TIMEOUT_GRACE
}

/// Page source backed by a reqwest client.
pub struct HttpPageSource {
    client: reqwest::Client,
    user_agents: Vec<String>,
}

impl HttpPageSource {
    /// Build a source from the collector configuration.
    ///
    /// The client timeout sits one second past the per-page wait, so the
    /// collector's own deadline fires first.
    pub fn new(config: &CollectorConfig) -> CollectResult<Self> {
        let user_agents: Vec<String> = config
            .user_agents
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        if user_agents.is_empty() {
            return Err(CollectError::config("user agent pool must not be empty"));
        }

        if !config.headless {
            info!("headless mode disabled, but the HTTP source never opens a window");
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(
            reqwest::header::UPGRADE_INSECURE_REQUESTS,
            reqwest::header::HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .timeout(client_timeout(config.page_wait))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| CollectError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            user_agents,
        })
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> CollectResult<String> {
        let user_agent = self.pick_user_agent().to_string();
        debug!(url = %url, user_agent = %user_agent, "HTTP fetch starting");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, timeout = e.is_timeout(), "HTTP request failed");
                CollectError::Http(Box::new(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP {} for {}", status, url),
            ))));
        }

        response
            .text()
            .await
            .map_err(|e| CollectError::Http(Box::new(e)))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_agent_pool() {
        let config = CollectorConfig::new().with_user_agents(["  ", ""]);
        assert!(matches!(
            HttpPageSource::new(&config),
            Err(CollectError::Config { .. })
        ));
    }

    #[test]
    fn picks_agents_from_pool() {
        let config = CollectorConfig::new().with_user_agents(["agent-a", "agent-b"]);
        let source = HttpPageSource::new(&config).unwrap();

        for _ in 0..20 {
            let agent = source.pick_user_agent();
            assert!(agent == "agent-a" || agent == "agent-b");
        }
    }

    #[test]
    fn client_timeout_outlasts_page_wait() {
        for wait in [Duration::ZERO, Duration::from_millis(300), Duration::from_secs(10)] {
            assert!(client_timeout(wait) > wait);
        }
        assert_eq!(client_timeout(Duration::from_secs(10)), Duration::from_secs(11));
    }
}
