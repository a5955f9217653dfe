use crate::domain::model::{EstimateResult, Filter, ProductPage, SourceData};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Catalog API port. One call fetches one page; the caller follows
/// `next_token` until it is absent.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn get_products(
        &self,
        service_code: &str,
        filters: &[Filter],
        next_token: Option<&str>,
    ) -> Result<ProductPage>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceData>;
    async fn transform(&self, data: SourceData) -> Result<EstimateResult>;
    async fn load(&self, result: EstimateResult) -> Result<String>;
}
