pub mod estimator_config;
pub mod scraper_config;

pub use estimator_config::*;
pub use scraper_config::*;
