pub mod catalog;
pub mod etl;
pub mod matcher;
pub mod pricing;

pub use crate::domain::model::{
    CatalogEntry, CatalogMap, EstimateResult, PriceQuote, ServerRequirement, SourceData,
};
pub use crate::domain::ports::{CatalogSource, Pipeline, Storage};
pub use crate::utils::error::Result;
