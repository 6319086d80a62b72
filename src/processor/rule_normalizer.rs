use polars::prelude::*;
use std::error::Error;
use std::fmt;
use tracing::{info, warn};

use crate::config::ColumnConfig;
use crate::processor::column_resolver::{ColumnResolver, ColumnRole, ColumnSource};
use crate::processor::value_parser::{parse_area, parse_int, parse_price};

#[derive(Debug)]
pub enum NormalizeError {
    MissingPriceColumn,
    MissingAreaColumn,
    Frame(PolarsError),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingPriceColumn => write!(
                f,
                "No price column found (expected price_numeric, price_text or a column named like 'үнэ'/'price')"
            ),
            NormalizeError::MissingAreaColumn => write!(
                f,
                "No area column found (expected area_numeric, Талбай or a column named like 'талбай'/'area')"
            ),
            NormalizeError::Frame(e) => write!(f, "DataFrame operation failed: {}", e),
        }
    }
}

impl Error for NormalizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NormalizeError::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PolarsError> for NormalizeError {
    fn from(e: PolarsError) -> Self {
        NormalizeError::Frame(e)
    }
}

/// Prepares a loaded listings table for model fitting.
///
/// After a successful run the frame has Float64 `price_numeric` and
/// `area_numeric` columns without nulls, and every configured integer column
/// that exists is Int64.
pub struct RuleNormalizer {
    resolver: ColumnResolver,
    integer_columns: Vec<String>,
}

impl RuleNormalizer {
    pub fn new(columns: &ColumnConfig) -> Self {
        Self {
            resolver: ColumnResolver::new(columns.area_label.clone()),
            integer_columns: columns.integer_columns.clone(),
        }
    }

    pub fn normalize_dataframe(&self, df: &mut DataFrame) -> Result<(), NormalizeError> {
        self.resolve_numeric_column(df, ColumnRole::Price)?;
        self.resolve_numeric_column(df, ColumnRole::Area)?;

        for column in &self.integer_columns {
            if df.column(column).is_ok() {
                self.normalize_integer_column(df, column)?;
            }
        }

        self.drop_incomplete_rows(df)?;
        Ok(())
    }

    fn resolve_numeric_column(&self, df: &mut DataFrame, role: ColumnRole) -> Result<(), NormalizeError> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let target = ColumnResolver::target_column(role);

        match self.resolver.resolve(role, &column_names) {
            Some(ColumnSource::Numeric(name)) => {
                let numeric = df.column(&name)?.cast(&DataType::Float64)?;
                df.with_column(numeric)?;
            }
            Some(ColumnSource::Text(name)) => {
                info!("Deriving {} from column '{}'", target, name);
                let parser: fn(&str) -> Option<f64> = match role {
                    ColumnRole::Price => parse_price,
                    ColumnRole::Area => parse_area,
                };
                let values: Vec<Option<f64>> = text_values(df, &name)?
                    .iter()
                    .map(|value| value.as_deref().and_then(parser))
                    .collect();
                df.with_column(Series::new(target.into(), values))?;
            }
            None => {
                return Err(match role {
                    ColumnRole::Price => NormalizeError::MissingPriceColumn,
                    ColumnRole::Area => NormalizeError::MissingAreaColumn,
                });
            }
        }

        Ok(())
    }

    fn normalize_integer_column(&self, df: &mut DataFrame, column: &str) -> Result<(), NormalizeError> {
        let values: Vec<Option<i64>> = text_values(df, column)?
            .iter()
            .map(|value| value.as_deref().and_then(parse_int))
            .collect();
        df.with_column(Series::new(column.into(), values))?;
        Ok(())
    }

    fn drop_incomplete_rows(&self, df: &mut DataFrame) -> Result<(), NormalizeError> {
        let before = df.height();
        let price_known = df.column(ColumnResolver::target_column(ColumnRole::Price))?.is_not_null();
        let area_known = df.column(ColumnResolver::target_column(ColumnRole::Area))?.is_not_null();
        let mask = &price_known & &area_known;

        *df = df.filter(&mask)?;

        let dropped = before - df.height();
        if dropped > 0 {
            warn!("Dropped {} of {} rows without price or area", dropped, before);
        }
        Ok(())
    }
}

impl Default for RuleNormalizer {
    fn default() -> Self {
        Self::new(&ColumnConfig::default())
    }
}

/// Column values as text regardless of the type the CSV reader inferred
pub fn text_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<String>>> {
    let as_text = df.column(column)?.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}
