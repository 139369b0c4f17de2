use std::collections::BTreeSet;
use std::time::Duration;

use relay_core::Endpoint;
use relay_logging::{relay_info, relay_warn};
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};

use crate::decode::decode_page;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {0}")]
    HttpStatus(u16),
}

/// One search-engine query URL and the label its results are reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Pause between consecutive queries.
    pub query_delay: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            request_timeout: Duration::from_secs(20),
            query_delay: Duration::from_secs(3),
        }
    }
}

/// Scrapes relay candidates out of asset-search result pages.
pub struct SearchScraper {
    client: reqwest::Client,
    settings: DiscoverySettings,
}

impl SearchScraper {
    pub fn new(settings: DiscoverySettings) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    /// Union of candidates over all queries. Failed queries are logged and skipped.
    pub async fn discover(&self, queries: &[SearchQuery]) -> BTreeSet<Endpoint> {
        let mut all = BTreeSet::new();
        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.query_delay).await;
            }
            relay_info!("Scraping candidates for {}", query.label);
            match self.fetch_candidates(&query.url).await {
                Ok(found) => {
                    relay_info!("{}: {} candidate(s)", query.label, found.len());
                    all.extend(found);
                }
                Err(err) => relay_warn!("Scraping {} failed: {}", query.label, err),
            }
        }
        all
    }

    pub async fn fetch_candidates(&self, url: &str) -> Result<BTreeSet<Endpoint>, DiscoveryError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::HttpStatus(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await?;
        let html = decode_page(&bytes, content_type.as_deref());
        Ok(extract_candidates(&html))
    }
}

/// Every `<a href="http://host:port...">` on the page, reduced to `host:port`.
pub fn extract_candidates(html: &str) -> BTreeSet<Endpoint> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return BTreeSet::new();
    };

    document
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| href.trim().strip_prefix("http://"))
        .filter_map(|rest| rest.split('/').next())
        .filter_map(Endpoint::parse)
        .collect()
}
