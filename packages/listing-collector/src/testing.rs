//! Testing utilities including a scripted page source.
//!
//! Useful for exercising the crawl loop without network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{CollectError, CollectResult};
use crate::traits::PageSource;

/// Scripted response for one URL.
#[derive(Debug, Clone)]
enum MockResponse {
    Html(String),
    Slow { html: String, delay: Duration },
    Fail(String),
}

/// A page source that serves predefined HTML by URL.
///
/// URLs without a scripted response fail with an HTTP error.
#[derive(Default, Clone)]
pub struct MockPageSource {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), MockResponse::Html(html.into()));
        self
    }

    /// Serve `html` for `url` after sleeping for `delay`.
    pub fn with_slow_page(
        self,
        url: impl Into<String>,
        html: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.responses.write().unwrap().insert(
            url.into(),
            MockResponse::Slow {
                html: html.into(),
                delay,
            },
        );
        self
    }

    /// Fail requests for `url` with the given message.
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), MockResponse::Fail(message.into()));
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch(&self, url: &str) -> CollectResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        let response = self.responses.read().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Html(html)) => Ok(html),
            Some(MockResponse::Slow { html, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(html)
            }
            Some(MockResponse::Fail(message)) => Err(CollectError::Http(message.into())),
            None => Err(CollectError::Http(format!("no mock page for {}", url).into())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Render a results page with one listing card per entry.
///
/// Each entry is `(name, price)`; a `None` price omits the price element.
pub fn listing_page(cards: &[(&str, Option<&str>)]) -> String {
    let body: String = cards
        .iter()
        .map(|(name, price)| {
            let price = price
                .map(|p| format!(r#"<div class="listing__price">{}</div>"#, p))
                .unwrap_or_default();
            format!(
                r#"<article class="listing">
  <h2 class="listing__title">{name}</h2>
  {price}
  <div class="listing__specs">
    <div>50K km</div>
    <div>Automatic</div>
    <div>Petrol</div>
    <div>Kuala Lumpur</div>
  </div>
</article>"#
            )
        })
        .collect();

    format!("<html><body><main>{}</main></body></html>", body)
}

/// A results page with no listing containers.
pub fn empty_page() -> String {
    "<html><body><main><p>No cars match your search.</p></main></body></html>".to_string()
}
