pub mod config;
pub mod estimator;
pub mod fetcher;
pub mod models;
pub mod processor;
pub mod storage;
