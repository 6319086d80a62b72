use anyhow::Result;
use scraper::Html;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::fetcher::page_source::PageSource;
use crate::models::ListingRecord;
use crate::processor::field_extractor::{ListingExtractor, parse_selector};

/// Everything a crawl accumulates. Owned by the caller so a run can be
/// seeded with URLs collected earlier.
#[derive(Debug, Default)]
pub struct CrawlState {
    seen_urls: HashSet<String>,
    records: Vec<ListingRecord>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seen<I: IntoIterator<Item = String>>(urls: I) -> Self {
        Self {
            seen_urls: urls.into_iter().collect(),
            records: Vec::new(),
        }
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Stores the record unless its URL was already collected
    pub fn push(&mut self, record: ListingRecord) -> bool {
        if !self.seen_urls.insert(record.url.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub listings_failed: usize,
    pub new_records: usize,
    pub limit_reached: bool,
}

/// Hrefs containing `marker`, first occurrence order, no repeats
pub fn extract_listing_links(html: &str, marker: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = parse_selector("a[href]")?;

    let mut seen = HashSet::new();
    let links = document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains(marker))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect();

    Ok(links)
}

/// Walks the category pages and turns every new listing into a record
pub struct Collector<S: PageSource> {
    source: S,
    extractor: ListingExtractor,
    config: ScraperConfig,
}

impl<S: PageSource> Collector<S> {
    pub fn new(source: S, extractor: ListingExtractor, config: ScraperConfig) -> Self {
        Self {
            source,
            extractor,
            config,
        }
    }

    pub async fn run(&self, state: &mut CrawlState) -> CrawlSummary {
        let mut summary = CrawlSummary::default();

        for page in 1..=self.config.scraping.pages {
            let url = self.config.category_page_url(page);
            info!("📄 Page {}: {}", page, url);

            let html = match self.source.fetch_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch category page {}: {}", page, e);
                    summary.pages_failed += 1;
                    continue;
                }
            };
            summary.pages_fetched += 1;

            let links = match extract_listing_links(&html, &self.config.site.listing_marker) {
                Ok(links) => links,
                Err(e) => {
                    warn!("Failed to extract links from page {}: {}", page, e);
                    continue;
                }
            };

            let before = state.len();
            let limit_reached = self.collect_links(&links, state, &mut summary).await;
            info!(
                "Page {}: {} links, {} new listings",
                page,
                links.len(),
                state.len() - before
            );

            if limit_reached {
                info!("Reached limit of {} listings, stopping", state.len());
                summary.limit_reached = true;
                break;
            }
        }

        info!(
            "✅ Crawl finished: {} new listings, {} pages fetched, {} pages failed, {} listings failed",
            summary.new_records, summary.pages_fetched, summary.pages_failed, summary.listings_failed
        );
        summary
    }

    /// Returns true once the configured limit has been reached
    async fn collect_links(
        &self,
        links: &[String],
        state: &mut CrawlState,
        summary: &mut CrawlSummary,
    ) -> bool {
        let delay = Duration::from_millis(self.config.scraping.delay_between_requests_ms);

        for link in links {
            if let Some(limit) = self.config.scraping.limit {
                if state.len() >= limit {
                    return true;
                }
            }

            let url = self.config.absolute_url(link);
            if state.is_seen(&url) {
                debug!("Skipping already collected {}", url);
                continue;
            }

            match self.collect_listing(&url).await {
                Ok(record) => {
                    if state.push(record) {
                        summary.new_records += 1;
                    }
                }
                Err(e) => {
                    warn!("⚠️ Failed to scrape listing {}: {}", url, e);
                    summary.listings_failed += 1;
                }
            }

            sleep(delay).await;
        }

        false
    }

    pub async fn collect_listing(&self, url: &str) -> Result<ListingRecord> {
        let html = self.source.fetch_page(url).await?;
        Ok(self.extractor.extract(&html, url))
    }
}
