use crate::core::config::AppConfig;
use crate::core::{QuoteSource, RawQuotes};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "x-api-key";

/// Fetches the latest quotes for a fixed list of pairs from an AwesomeAPI-compatible
/// endpoint (`/json/last/CAD-BRL,ARS-BRL,...`).
pub struct AwesomeApiSource {
    base_url: String,
    pairs: Vec<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AwesomeApiSource {
    pub fn new(base_url: &str, pairs: Vec<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("quotewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pairs,
            api_key,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.provider.base_url,
            config.pairs.iter().map(|p| p.pair.clone()).collect(),
            config.provider.api_key.clone(),
        )
    }

    fn quotes_url(&self) -> String {
        format!("{}/json/last/{}", self.base_url, self.pairs.join(","))
    }
}

#[async_trait]
impl QuoteSource for AwesomeApiSource {
    #[instrument(name = "AwesomeApiFetch", skip(self))]
    async fn fetch_quotes(&self) -> Result<RawQuotes> {
        let url = self.quotes_url();
        debug!("Requesting quotes from {}", url);

        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request failed for URL: {url}"))?
            .error_for_status()
            .context("Quote API returned an error status")?;

        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;

        let quotes: RawQuotes = serde_json::from_str(&response_text).with_context(|| {
            format!("Failed to parse quote response. Response: '{response_text}'")
        })?;

        debug!(count = quotes.len(), "Received quotes");
        Ok(quotes)
    }
}
