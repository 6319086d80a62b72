use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

use crate::config::ScraperConfig;

/// Anything that can hand back the HTML of a page
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP(S) with a fixed client identity
pub struct HttpPageSource {
    client: Client,
    user_agent: String,
}

impl HttpPageSource {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .timeout(Duration::from_secs(config.scraping.timeout_seconds))
            .build()?;

        Ok(HttpPageSource {
            client,
            user_agent: config.site.user_agent.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .send()
            .await
            .map_err(|e| anyhow!("Network error: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response text: {}", e))?;

        debug!("Fetched {} characters from {}", html.len(), url);
        Ok(html)
    }
}
