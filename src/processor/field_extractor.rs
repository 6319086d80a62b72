use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::SelectorConfig;
use crate::models::{District, ListingRecord, PropertyMap};
use crate::processor::value_parser::{parse_listing_area, parse_listing_price};

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector '{}': {:?}", selector, e))
}

/// Text of an element with every text node trimmed, NBSP turned into spaces
pub fn clean_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .collect::<String>()
        .replace('\u{00A0}', " ")
        .trim()
        .to_string()
}

/// One way of pulling label/value pairs out of a listing page
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Html) -> PropertyMap;
}

/// `.name`/`.value` pairs from the attribute block under the price title
pub struct PropertyLayoutStrategy {
    row: Selector,
    name: Selector,
    value: Selector,
}

impl PropertyLayoutStrategy {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&config.property_row)?,
            name: parse_selector(&config.property_name)?,
            value: parse_selector(&config.property_value)?,
        })
    }
}

impl ExtractionStrategy for PropertyLayoutStrategy {
    fn name(&self) -> &'static str {
        "property-layout"
    }

    fn extract(&self, document: &Html) -> PropertyMap {
        let mut properties = PropertyMap::new();
        for row in document.select(&self.row) {
            let key = row.select(&self.name).next().map(clean_text).unwrap_or_default();
            let value = row.select(&self.value).next().map(clean_text).unwrap_or_default();
            if !key.is_empty() {
                properties.insert(key, value);
            }
        }
        properties
    }
}

/// Generic two-column table rows: first cell is the label
pub struct TableRowStrategy {
    row: Selector,
    cell: Selector,
}

impl TableRowStrategy {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&config.table_row)?,
            cell: parse_selector(&config.table_cell)?,
        })
    }
}

impl ExtractionStrategy for TableRowStrategy {
    fn name(&self) -> &'static str {
        "table-rows"
    }

    fn extract(&self, document: &Html) -> PropertyMap {
        let mut properties = PropertyMap::new();
        for row in document.select(&self.row) {
            let cells: Vec<ElementRef> = row.select(&self.cell).collect();
            if cells.len() < 2 {
                continue;
            }
            let key = clean_text(cells[0]).replace(':', "");
            if !key.is_empty() {
                properties.insert(key, clean_text(cells[1]));
            }
        }
        properties
    }
}

/// List items of the form `label: value`
pub struct ListItemStrategy {
    item: Selector,
}

impl ListItemStrategy {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&config.list_item)?,
        })
    }
}

impl ExtractionStrategy for ListItemStrategy {
    fn name(&self) -> &'static str {
        "list-items"
    }

    fn extract(&self, document: &Html) -> PropertyMap {
        let mut properties = PropertyMap::new();
        for item in document.select(&self.item) {
            let text = clean_text(item);
            if let Some((key, value)) = text.split_once(':') {
                properties.insert(key.trim(), value.trim());
            }
        }
        properties
    }
}

/// Runs every inner strategy and merges the results, later keys winning
pub struct MergedStrategy {
    name: &'static str,
    parts: Vec<Box<dyn ExtractionStrategy>>,
}

impl MergedStrategy {
    pub fn new(name: &'static str, parts: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { name, parts }
    }
}

impl ExtractionStrategy for MergedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, document: &Html) -> PropertyMap {
        let mut properties = PropertyMap::new();
        for part in &self.parts {
            properties.merge(part.extract(document));
        }
        properties
    }
}

/// Turns a listing page into a [`ListingRecord`].
///
/// Label/value pairs come from the first strategy in the chain that finds
/// anything. Price, area, address and district are derived afterwards.
pub struct ListingExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    price_selectors: Vec<Selector>,
    address: Selector,
    area_label: String,
}

impl ListingExtractor {
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        let fallbacks: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(TableRowStrategy::new(config)?),
            Box::new(ListItemStrategy::new(config)?),
        ];
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(PropertyLayoutStrategy::new(config)?),
            Box::new(MergedStrategy::new("generic-fallback", fallbacks)),
        ];

        let price_selectors = config
            .price_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            strategies,
            price_selectors,
            address: parse_selector(&config.address)?,
            area_label: config.area_label.clone(),
        })
    }

    pub fn extract(&self, html: &str, url: &str) -> ListingRecord {
        let document = Html::parse_document(html);

        let properties = self.extract_properties(&document);
        let price_text = self.extract_price_text(&document);
        let price_numeric = parse_listing_price(&price_text);
        let area_numeric = properties
            .get(&self.area_label)
            .and_then(parse_listing_area);
        let address_text = document.select(&self.address).next().map(clean_text);
        let district = address_text.as_deref().and_then(District::from_address);

        ListingRecord {
            properties,
            price_text,
            price_numeric,
            area_numeric,
            address_text,
            district,
            url: url.to_string(),
        }
    }

    pub fn extract_properties(&self, document: &Html) -> PropertyMap {
        for strategy in &self.strategies {
            let properties = strategy.extract(document);
            if !properties.is_empty() {
                debug!(
                    "Strategy '{}' extracted {} properties",
                    strategy.name(),
                    properties.len()
                );
                return properties;
            }
        }
        debug!("No strategy extracted any properties");
        PropertyMap::new()
    }

    fn extract_price_text(&self, document: &Html) -> String {
        self.price_selectors
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .map(clean_text)
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}
