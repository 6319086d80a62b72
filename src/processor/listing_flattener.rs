use anyhow::{Result, anyhow};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::info;

use crate::models::{AREA_NUMERIC, FieldValue, ListingRecord, PRICE_NUMERIC};

/// Flattens listing records into one table, one column per label.
///
/// Columns appear in the order they are first seen across the records. A
/// record without a given label gets a null in that column.
pub struct ListingFlattener;

impl ListingFlattener {
    pub fn new() -> Self {
        ListingFlattener
    }

    pub fn column_names(&self, records: &[ListingRecord]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            for (name, _) in record.fields() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    pub fn flatten_to_dataframe(&self, records: &[ListingRecord]) -> Result<DataFrame> {
        if records.is_empty() {
            return Ok(DataFrame::empty());
        }

        let rows: Vec<HashMap<&str, FieldValue<'_>>> = records
            .iter()
            .map(|record| record.fields().into_iter().collect())
            .collect();

        let mut columns = Vec::new();
        for name in self.column_names(records) {
            let series = if is_numeric_column(&name) {
                let values: Vec<Option<f64>> = rows
                    .iter()
                    .map(|row| match row.get(name.as_str()) {
                        Some(FieldValue::Number(n)) => Some(*n),
                        _ => None,
                    })
                    .collect();
                Series::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|row| match row.get(name.as_str()) {
                        Some(FieldValue::Text(text)) => Some(text.to_string()),
                        Some(FieldValue::Number(n)) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect();
                Series::new(name.as_str().into(), values)
            };
            columns.push(series.into());
        }

        let df = DataFrame::new(columns).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))?;
        info!(
            "Flattened {} listings into {} columns",
            df.height(),
            df.width()
        );
        Ok(df)
    }
}

fn is_numeric_column(name: &str) -> bool {
    name == PRICE_NUMERIC || name == AREA_NUMERIC
}

impl Default for ListingFlattener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{District, PropertyMap};

    fn record(url: &str, properties: &[(&str, &str)], area: Option<f64>) -> ListingRecord {
        ListingRecord {
            properties: properties.iter().copied().collect::<PropertyMap>(),
            price_text: "100 сая".to_string(),
            price_numeric: Some(100.0),
            area_numeric: area,
            address_text: None,
            district: Some(District::KhanUul),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_column_union_in_first_seen_order() {
        let flattener = ListingFlattener::new();
        let records = vec![
            record("a", &[("Шал", "Паркет")], Some(50.0)),
            record("b", &[("Гараж", "Байгаа"), ("Шал", "Ламинат")], None),
        ];

        let names = flattener.column_names(&records);
        assert_eq!(names[0], "Шал");
        assert_eq!(names[1], "price_text");
        assert_eq!(names.last().unwrap(), "Гараж");
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_flatten_fills_missing_with_null() {
        let flattener = ListingFlattener::new();
        let records = vec![
            record("a", &[("Шал", "Паркет")], Some(50.0)),
            record("b", &[("Гараж", "Байгаа")], None),
        ];

        let df = flattener.flatten_to_dataframe(&records).unwrap();
        assert_eq!(df.height(), 2);

        let garage = df.column("Гараж").unwrap().str().unwrap();
        assert_eq!(garage.get(0), None);
        assert_eq!(garage.get(1), Some("Байгаа"));

        let area = df.column("area_numeric").unwrap().f64().unwrap();
        assert_eq!(area.get(0), Some(50.0));
        assert_eq!(area.get(1), None);

        let district = df.column("district").unwrap().str().unwrap();
        assert_eq!(district.get(0), Some("Хан-Уул"));
    }

    #[test]
    fn test_empty_records() {
        let df = ListingFlattener::new().flatten_to_dataframe(&[]).unwrap();
        assert_eq!(df.height(), 0);
    }
}
