//! Municipal school dropout forecasting: dataset ingest, feature engineering,
//! entity resolution for what-if scenarios, and population-weighted analytics.

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forecast;
pub mod telemetry;
