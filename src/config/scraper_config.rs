use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Configuration for the listings collector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub scraping: ScrapingConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Basic site information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    /// Appended to `base_url`, the page number goes right after it
    pub category_path: String,
    pub user_agent: String,
    /// Path fragment that marks an anchor as a listing link
    pub listing_marker: String,
}

/// Scraping behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub pages: u32,
    pub limit: Option<usize>,
    pub delay_between_requests_ms: u64,
    pub timeout_seconds: u64,
}

/// CSS selectors and labels used on a listing page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub property_row: String,
    pub property_name: String,
    pub property_value: String,
    pub table_row: String,
    pub table_cell: String,
    pub list_item: String,
    pub price_selectors: Vec<String>,
    pub address: String,
    pub area_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_path: String,
    pub json_path: String,
}

impl ScraperConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scraper config file: {}", path))?;
        let config: ScraperConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse scraper config file: {}", path))?;
        Ok(config)
    }

    /// Load from `path` when it exists, built-in defaults otherwise
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            info!("Loading scraper config from {}", path);
            Self::from_file(path)
        } else {
            warn!("Scraper config {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// URL of the category page with the given 1-based index
    pub fn category_page_url(&self, page: u32) -> String {
        format!("{}{}{}", self.site.base_url, self.site.category_path, page)
    }

    /// Resolve a listing href against the site base URL
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.site.base_url, href)
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "unegui".to_string(),
            base_url: "https://www.unegui.mn".to_string(),
            category_path: "/l-hdlh/l-hdlh-zarna/oron-suuts-zarna/2-r/?page=".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            listing_marker: "/adv/".to_string(),
        }
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            pages: 20,
            limit: None,
            delay_between_requests_ms: 500,
            timeout_seconds: 10,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            property_row: ".price-title + .property".to_string(),
            property_name: ".name".to_string(),
            property_value: ".value".to_string(),
            table_row: "table tr".to_string(),
            table_cell: "td, th".to_string(),
            list_item: "ul li".to_string(),
            price_selectors: vec![".price".to_string(), ".announcement-price".to_string()],
            address: "span[itemprop=\"address\"]".to_string(),
            area_label: "Талбай".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "unegui_data.csv".to_string(),
            json_path: "unegui_data.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = ScraperConfig::default();
        assert_eq!(config.scraping.pages, 20);
        assert_eq!(config.scraping.delay_between_requests_ms, 500);
        assert!(config.scraping.limit.is_none());
        assert_eq!(config.selectors.price_selectors.len(), 2);
        assert_eq!(config.selectors.area_label, "Талбай");
    }

    #[test]
    fn test_category_page_url() {
        let config = ScraperConfig::default();
        assert_eq!(
            config.category_page_url(3),
            "https://www.unegui.mn/l-hdlh/l-hdlh-zarna/oron-suuts-zarna/2-r/?page=3"
        );
    }

    #[test]
    fn test_absolute_url() {
        let config = ScraperConfig::default();
        assert_eq!(
            config.absolute_url("/adv/123_flat/"),
            "https://www.unegui.mn/adv/123_flat/"
        );
        assert_eq!(
            config.absolute_url("https://other.mn/adv/1/"),
            "https://other.mn/adv/1/"
        );
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: ScraperConfig = toml::from_str(
            r#"
            [scraping]
            pages = 2
            limit = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.scraping.pages, 2);
        assert_eq!(config.scraping.limit, Some(5));
        assert_eq!(config.scraping.timeout_seconds, 10);
        assert_eq!(config.site.base_url, "https://www.unegui.mn");
    }
}
