use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::warn;

use crate::estimator::feature_encoder::{ColumnData, FeatureKind, FeatureValue};
use crate::estimator::price_model::PriceModel;

/// One question of the estimate form
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    /// Pick one of the values seen in the dataset; the first is the default
    Choice { name: String, options: Vec<String> },
    Number { name: String, default: f64 },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Choice { name, .. } | FormField::Number { name, .. } => name,
        }
    }

    /// Value of the option picked at `index`
    pub fn choice(&self, index: usize) -> FeatureValue {
        match self {
            FormField::Choice { options, .. } => options
                .get(index)
                .map(|option| FeatureValue::Category(option.clone()))
                .unwrap_or(FeatureValue::Missing),
            FormField::Number { .. } => FeatureValue::Missing,
        }
    }
}

/// Builds one field per model feature from the full dataset
pub fn build_form(df: &DataFrame, model: &PriceModel) -> Result<Vec<FormField>> {
    let all_rows: Vec<usize> = (0..df.height()).collect();
    let mut fields = Vec::new();

    for feature in model.feature_columns() {
        let data = ColumnData::from_frame(df, &feature.name)?;
        let field = match feature.kind {
            FeatureKind::Categorical { .. } => FormField::Choice {
                name: feature.name.clone(),
                options: data.distinct(&all_rows),
            },
            FeatureKind::Numeric { .. } => FormField::Number {
                name: feature.name.clone(),
                default: data.mean(&all_rows).map(f64::trunc).unwrap_or(0.0),
            },
        };
        fields.push(field);
    }

    Ok(fields)
}

/// Asks every field in turn on the terminal
pub fn fill_form(fields: &[FormField]) -> Result<HashMap<String, FeatureValue>> {
    let theme = ColorfulTheme::default();
    let mut values = HashMap::new();

    for field in fields {
        let value = match field {
            FormField::Choice { name, options } if options.is_empty() => {
                warn!("{} has no values in the dataset, skipped", name);
                FeatureValue::Missing
            }
            FormField::Choice { name, options } => {
                let index = Select::with_theme(&theme)
                    .with_prompt(name)
                    .items(options)
                    .default(0)
                    .interact()?;
                field.choice(index)
            }
            FormField::Number { name, default } => {
                let number: f64 = Input::with_theme(&theme)
                    .with_prompt(name)
                    .default(*default)
                    .interact_text()?;
                FeatureValue::Number(number)
            }
        };
        values.insert(field.name().to_string(), value);
    }

    Ok(values)
}

pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Whole tögrög with thousands separators, e.g. `1,234,567 ₮`
pub fn format_price(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0 { "-" } else { "" };
    format!("{}{} ₮", sign, grouped)
}
