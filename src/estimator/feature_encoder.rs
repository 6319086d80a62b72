use anyhow::{Result, anyhow};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::processor::text_values;

/// A single input value for one feature column
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Category(String),
    Number(f64),
    Missing,
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Category(value) => write!(f, "{}", value),
            FeatureValue::Number(value) => write!(f, "{}", value),
            FeatureValue::Missing => write!(f, "-"),
        }
    }
}

/// Raw values of one dataset column, typed by what the CSV reader inferred
#[derive(Debug, Clone)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl ColumnData {
    pub fn from_frame(df: &DataFrame, name: &str) -> PolarsResult<Self> {
        let column = df.column(name)?;
        if column.dtype() == &DataType::String {
            return Ok(ColumnData::Text(text_values(df, name)?));
        }

        let numeric = column.cast(&DataType::Float64)?;
        Ok(ColumnData::Numeric(numeric.f64()?.into_iter().collect()))
    }

    pub fn value(&self, row: usize) -> FeatureValue {
        match self {
            ColumnData::Text(values) => match values.get(row) {
                Some(Some(value)) => FeatureValue::Category(value.clone()),
                _ => FeatureValue::Missing,
            },
            ColumnData::Numeric(values) => match values.get(row) {
                Some(Some(value)) => FeatureValue::Number(*value),
                _ => FeatureValue::Missing,
            },
        }
    }

    /// Distinct non-null text values in first-seen order
    pub fn distinct(&self, rows: &[usize]) -> Vec<String> {
        let ColumnData::Text(values) = self else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        rows.iter()
            .filter_map(|&row| values.get(row).cloned().flatten())
            .filter(|value| seen.insert(value.clone()))
            .collect()
    }

    /// Mean over non-null numeric values, None when there are none
    pub fn mean(&self, rows: &[usize]) -> Option<f64> {
        let ColumnData::Numeric(values) = self else {
            return None;
        };

        let present: Vec<f64> = rows
            .iter()
            .filter_map(|&row| values.get(row).copied().flatten())
            .collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Categorical { categories: Vec<String> },
    Numeric { mean: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// The feature columns of a dataset, pulled out of the frame once
pub struct FeatureTable {
    columns: Vec<(String, ColumnData)>,
    rows: usize,
}

impl FeatureTable {
    /// Keeps the requested columns that exist in the frame, in request order
    pub fn from_frame(df: &DataFrame, feature_columns: &[String]) -> Result<Self> {
        let mut columns = Vec::new();
        for name in feature_columns {
            if df.column(name).is_ok() {
                columns.push((name.clone(), ColumnData::from_frame(df, name)?));
            }
        }

        if columns.is_empty() {
            return Err(anyhow!(
                "None of the feature columns are present in the dataset: {}",
                feature_columns.join(", ")
            ));
        }

        Ok(Self {
            columns,
            rows: df.height(),
        })
    }

    pub fn columns(&self) -> &[(String, ColumnData)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, row: usize) -> HashMap<String, FeatureValue> {
        self.columns
            .iter()
            .map(|(name, data)| (name.clone(), data.value(row)))
            .collect()
    }
}

/// One-hot encodes text columns and passes numeric columns through.
///
/// Categories and means are learned from the rows given to [`FeatureEncoder::fit`].
/// At encode time an unknown or missing category becomes all zeros and a
/// missing number becomes the learned mean.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    columns: Vec<FeatureColumn>,
}

impl FeatureEncoder {
    pub fn fit(table: &FeatureTable, rows: &[usize]) -> Self {
        let columns = table
            .columns()
            .iter()
            .map(|(name, data)| {
                let kind = match data {
                    ColumnData::Text(_) => FeatureKind::Categorical {
                        categories: data.distinct(rows),
                    },
                    ColumnData::Numeric(_) => FeatureKind::Numeric {
                        mean: data.mean(rows).unwrap_or(0.0),
                    },
                };
                FeatureColumn {
                    name: name.clone(),
                    kind,
                }
            })
            .collect();

        Self { columns }
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Length of an encoded row
    pub fn width(&self) -> usize {
        self.columns
            .iter()
            .map(|column| match &column.kind {
                FeatureKind::Categorical { categories } => categories.len(),
                FeatureKind::Numeric { .. } => 1,
            })
            .sum()
    }

    pub fn encode(&self, row: &HashMap<String, FeatureValue>) -> Vec<f64> {
        let mut encoded = Vec::with_capacity(self.width());

        for column in &self.columns {
            let value = row.get(&column.name).unwrap_or(&FeatureValue::Missing);
            match &column.kind {
                FeatureKind::Categorical { categories } => {
                    let selected = match value {
                        FeatureValue::Category(category) => Some(category.as_str()),
                        _ => None,
                    };
                    encoded.extend(categories.iter().map(|category| {
                        if Some(category.as_str()) == selected { 1.0 } else { 0.0 }
                    }));
                }
                FeatureKind::Numeric { mean } => {
                    let number = match value {
                        FeatureValue::Number(number) if number.is_finite() => *number,
                        _ => *mean,
                    };
                    encoded.push(number);
                }
            }
        }

        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        let df = DataFrame::new(vec![
            Series::new(
                "district".into(),
                vec![Some("Баянгол"), Some("Хан-Уул"), None, Some("Баянгол")],
            )
            .into(),
            Series::new("area_numeric".into(), vec![Some(40.0), None, Some(80.0), Some(60.0)]).into(),
        ])
        .unwrap();

        let features = vec!["district".to_string(), "Гараж".to_string(), "area_numeric".to_string()];
        FeatureTable::from_frame(&df, &features).unwrap()
    }

    #[test]
    fn test_missing_feature_columns_are_skipped() {
        let table = table();
        let names: Vec<&str> = table.columns().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["district", "area_numeric"]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_fit_learns_categories_and_means() {
        let table = table();
        let encoder = FeatureEncoder::fit(&table, &[0, 1, 2]);

        assert_eq!(
            encoder.columns()[0].kind,
            FeatureKind::Categorical {
                categories: vec!["Баянгол".to_string(), "Хан-Уул".to_string()]
            }
        );
        assert_eq!(encoder.columns()[1].kind, FeatureKind::Numeric { mean: 60.0 });
        assert_eq!(encoder.width(), 3);
    }

    #[test]
    fn test_encode_known_row() {
        let table = table();
        let encoder = FeatureEncoder::fit(&table, &[0, 1, 2, 3]);

        assert_eq!(encoder.encode(&table.row(1)), vec![0.0, 1.0, 60.0]);
        assert_eq!(encoder.encode(&table.row(3)), vec![1.0, 0.0, 60.0]);
    }

    #[test]
    fn test_unknown_and_missing_values() {
        let table = table();
        let encoder = FeatureEncoder::fit(&table, &[0, 1, 2, 3]);

        let mut row = HashMap::new();
        row.insert("district".to_string(), FeatureValue::Category("Налайх".to_string()));
        assert_eq!(encoder.encode(&row), vec![0.0, 0.0, 60.0]);

        assert_eq!(encoder.encode(&table.row(2)), vec![0.0, 0.0, 80.0]);
    }

    #[test]
    fn test_no_feature_columns() {
        let df = DataFrame::new(vec![Series::new("url".into(), vec!["a"]).into()]).unwrap();
        assert!(FeatureTable::from_frame(&df, &["district".to_string()]).is_err());
    }

    #[test]
    fn test_integer_column_is_numeric() {
        let df = DataFrame::new(vec![
            Series::new("Цонхны тоо".into(), vec![Some(2i64), None, Some(4i64)]).into(),
        ])
        .unwrap();
        let table = FeatureTable::from_frame(&df, &["Цонхны тоо".to_string()]).unwrap();

        assert_eq!(table.columns()[0].1.mean(&[0, 1, 2]), Some(3.0));
        assert_eq!(table.row(1)["Цонхны тоо"], FeatureValue::Missing);
    }
}
