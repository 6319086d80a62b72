use anyhow::{Context, Result};
use std::env;
use tracing::info;

use unegui_pipeline::config::EstimatorConfig;
use unegui_pipeline::estimator::{PriceModel, build_form, confirm, fill_form, format_price};
use unegui_pipeline::processor::RuleNormalizer;
use unegui_pipeline::storage::FileStorage;

const DEFAULT_DATASET: &str = "unegui_data.csv";
const DEFAULT_CONFIG: &str = "src/configs/estimator.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let dataset_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATASET.to_string());
    let config_path = env::var("ESTIMATOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = EstimatorConfig::load_or_default(&config_path)
        .context("Failed to load estimator configuration")?;

    let mut df = FileStorage::load_csv(&dataset_path)?;

    RuleNormalizer::new(&config.columns)
        .normalize_dataframe(&mut df)
        .context("Dataset cannot be used for estimation")?;
    info!("{} rows with price and area after normalization", df.height());

    let model = PriceModel::train(&df, &config)?;
    let form = build_form(&df, &model)?;

    match model.r2() {
        Some(score) => println!("📊 ML загварын R² score: {:.2}", score),
        None => println!("📊 R² score unavailable, test split too small"),
    }

    loop {
        println!("\n🔮 Үнэ таамаглуулах");
        let values = fill_form(&form)?;
        let prediction = model.predict(&values)?;
        println!("💰 ML таамагласан үнэ: {}", format_price(prediction));

        if !confirm("Another estimate?")? {
            break;
        }
    }

    Ok(())
}
