use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Configuration for the price estimator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub columns: ColumnConfig,
    pub model: ModelConfig,
}

/// Dataset column names the estimator knows about
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub area_label: String,
    /// Free-text columns converted with the integer parser
    pub integer_columns: Vec<String>,
    /// Model inputs, in form order; missing ones are skipped
    pub feature_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_trees: usize,
    pub seed: u64,
    pub test_size: f64,
}

impl EstimatorConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read estimator config file: {}", path))?;
        let config: EstimatorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse estimator config file: {}", path))?;
        Ok(config)
    }

    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            info!("Loading estimator config from {}", path);
            Self::from_file(path)
        } else {
            warn!("Estimator config {} not found, using defaults", path);
            Ok(Self::default())
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            area_label: "Талбай".to_string(),
            integer_columns: names(&[
                "Барилгын давхар",
                "Цонхны тоо",
                "Ашиглалтанд орсон он",
                "Хэдэн давхарт",
            ]),
            feature_columns: names(&[
                "district",
                "Шал",
                "Тагт",
                "Ашиглалтанд орсон он",
                "Гараж",
                "Цонх",
                "Барилгын давхар",
                "Хаалга",
                "area_numeric",
                "Хэдэн давхарт",
                "Цонхны тоо",
                "Барилгын явц",
                "Цахилгаан шаттай эсэх",
            ]),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            test_size: 0.2,
        }
    }
}
