use anyhow::{Result, anyhow};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::{EstimatorConfig, ModelConfig};
use crate::estimator::feature_encoder::{FeatureColumn, FeatureEncoder, FeatureTable, FeatureValue};
use crate::models::PRICE_NUMERIC;

/// Random forest price regressor over the encoded feature columns
pub struct PriceModel {
    encoder: FeatureEncoder,
    forest: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    r2: Option<f64>,
    train_rows: usize,
    test_rows: usize,
}

impl PriceModel {
    /// Fits on a normalized frame. `price_numeric` must be present and non-null.
    pub fn train(df: &DataFrame, config: &EstimatorConfig) -> Result<Self> {
        if df.height() < 2 {
            return Err(anyhow!(
                "Need at least 2 rows with price and area to train, got {}",
                df.height()
            ));
        }

        let table = FeatureTable::from_frame(df, &config.columns.feature_columns)?;
        let target = target_values(df)?;
        let (train, test) = split_rows(df.height(), &config.model);

        let encoder = FeatureEncoder::fit(&table, &train);
        if encoder.width() == 0 {
            return Err(anyhow!("Feature columns hold no usable values"));
        }

        let x_train = encode_rows(&encoder, &table, &train);
        let y_train: Vec<f64> = train.iter().map(|&row| target[row]).collect();

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(config.model.n_trees)
            .with_seed(config.model.seed);

        let forest = RandomForestRegressor::fit(&x_train, &y_train, params)
            .map_err(|e| anyhow!("Failed to fit random forest: {}", e))?;

        let mut model = PriceModel {
            encoder,
            forest,
            r2: None,
            train_rows: train.len(),
            test_rows: test.len(),
        };

        if test.len() >= 2 {
            let x_test = encode_rows(&model.encoder, &table, &test);
            let predicted = model
                .forest
                .predict(&x_test)
                .map_err(|e| anyhow!("Failed to score test split: {}", e))?;
            let actual: Vec<f64> = test.iter().map(|&row| target[row]).collect();
            model.r2 = r2_score(&actual, &predicted);
        } else {
            warn!("Test split has {} rows, skipping R² score", test.len());
        }

        info!(
            "Trained on {} rows with {} encoded features ({} test rows)",
            model.train_rows,
            model.encoder.width(),
            model.test_rows
        );
        Ok(model)
    }

    pub fn predict(&self, input: &HashMap<String, FeatureValue>) -> Result<f64> {
        let features = DenseMatrix::from_2d_vec(&vec![self.encoder.encode(input)]);
        let predictions = self
            .forest
            .predict(&features)
            .map_err(|e| anyhow!("Prediction failed: {}", e))?;

        predictions
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Model returned no prediction"))
    }

    pub fn feature_columns(&self) -> &[FeatureColumn] {
        self.encoder.columns()
    }

    /// Coefficient of determination on the held-out rows
    pub fn r2(&self) -> Option<f64> {
        self.r2
    }

    pub fn train_rows(&self) -> usize {
        self.train_rows
    }

    pub fn test_rows(&self) -> usize {
        self.test_rows
    }
}

fn target_values(df: &DataFrame) -> Result<Vec<f64>> {
    let prices = df.column(PRICE_NUMERIC)?.cast(&DataType::Float64)?;
    prices
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, price)| price.ok_or_else(|| anyhow!("Row {} has no price", row)))
        .collect()
}

/// Seeded shuffle, then the first `ceil(n * test_size)` rows go to the test
/// split. At least one row always stays in training.
pub fn split_rows(rows: usize, config: &ModelConfig) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let test_size = config.test_size.clamp(0.0, 1.0);
    let test_count = ((rows as f64 * test_size).ceil() as usize).min(rows.saturating_sub(1));

    let test = indices[..test_count].to_vec();
    let train = indices[test_count..].to_vec();
    (train, test)
}

fn encode_rows(encoder: &FeatureEncoder, table: &FeatureTable, rows: &[usize]) -> DenseMatrix<f64> {
    let encoded: Vec<Vec<f64>> = rows.iter().map(|&row| encoder.encode(&table.row(row))).collect();
    DenseMatrix::from_2d_vec(&encoded)
}

pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return None;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    }
}
