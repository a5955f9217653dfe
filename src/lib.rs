pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::pricing_api::HttpCatalogSource;
pub use app::pipelines::estimate_pipeline::EstimatePipeline;
pub use config::{EstimateConfig, LocalStorage};
pub use core::etl::EstimateEngine;
pub use utils::error::{EstimateError, Result};
