use crate::domain::model::{DeploymentOption, Filter};
use crate::domain::ports::CatalogSource;
use crate::utils::error::{EstimateError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// One product record, decoded from the JSON string the provider puts in
/// each `PriceList` entry. The schema is fixed by the provider.
#[derive(Debug, Deserialize)]
pub struct PriceRecord {
    pub product: ProductInfo,
    #[serde(default)]
    pub terms: Option<Terms>,
}

#[derive(Debug, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct Terms {
    #[serde(rename = "OnDemand", default)]
    pub on_demand: HashMap<String, OnDemandTerm>,
}

#[derive(Debug, Deserialize)]
pub struct OnDemandTerm {
    #[serde(rename = "priceDimensions", default)]
    pub price_dimensions: HashMap<String, PriceDimension>,
}

#[derive(Debug, Deserialize)]
pub struct PriceDimension {
    #[serde(rename = "pricePerUnit", default)]
    pub price_per_unit: HashMap<String, String>,
    pub unit: Option<String>,
}

impl PriceRecord {
    /// Walks terms → first on-demand term → first price dimension → USD.
    /// Exact-match filters yield at most one product, so "first" is the
    /// only entry in practice; any missing layer is a malformed record.
    pub fn hourly_usd(&self, instance_type: &str) -> Result<f64> {
        let malformed = |reason: &str| EstimateError::MalformedPriceRecord {
            instance_type: instance_type.to_string(),
            reason: reason.to_string(),
        };

        let terms = self.terms.as_ref().ok_or_else(|| malformed("missing terms"))?;
        let term = terms
            .on_demand
            .values()
            .next()
            .ok_or_else(|| malformed("no on-demand term"))?;
        let dimension = term
            .price_dimensions
            .values()
            .next()
            .ok_or_else(|| malformed("no price dimension"))?;
        let usd = dimension
            .price_per_unit
            .get("USD")
            .ok_or_else(|| malformed("no USD unit price"))?;

        usd.parse::<f64>()
            .map_err(|_| malformed(&format!("unparsable USD unit price '{}'", usd)))
    }
}

/// Resolves on-demand monthly prices against the catalog. Region, hours per
/// month and the flat per-GB storage rate are injected from configuration.
pub struct PriceResolver<'a, C: CatalogSource> {
    source: &'a C,
    region: String,
    hours_per_month: f64,
    storage_rate: f64,
}

impl<'a, C: CatalogSource> PriceResolver<'a, C> {
    pub fn new(source: &'a C, region: &str, hours_per_month: f64, storage_rate: f64) -> Self {
        Self {
            source,
            region: region.to_string(),
            hours_per_month,
            storage_rate,
        }
    }

    /// Monthly compute price for one instance type, storage included.
    /// `Ok(None)` means the catalog listed no product for these filters.
    pub async fn compute_monthly(
        &self,
        service_code: &str,
        instance_type: &str,
        storage_gb: f64,
    ) -> Result<Option<f64>> {
        let filters = vec![
            Filter::term("location", &self.region),
            Filter::term("instanceType", instance_type),
            Filter::term("termType", "OnDemand"),
        ];

        match self.query_hourly(service_code, instance_type, &filters).await? {
            Some(hourly) => Ok(Some(self.to_monthly(instance_type, hourly, storage_gb))),
            None => Ok(None),
        }
    }

    /// Monthly managed-database price for one instance type, discriminated
    /// by engine and deployment topology.
    pub async fn database_monthly(
        &self,
        service_code: &str,
        instance_type: &str,
        engine: &str,
        deployment: DeploymentOption,
        storage_gb: f64,
    ) -> Result<Option<f64>> {
        let filters = vec![
            Filter::term("location", &self.region),
            Filter::term("instanceType", instance_type),
            Filter::term("termType", "OnDemand"),
            Filter::term("databaseEngine", engine),
            Filter::term("deploymentOption", deployment.as_str()),
        ];

        match self.query_hourly(service_code, instance_type, &filters).await? {
            Some(hourly) => Ok(Some(self.to_monthly(instance_type, hourly, storage_gb))),
            None => Ok(None),
        }
    }

    async fn query_hourly(
        &self,
        service_code: &str,
        instance_type: &str,
        filters: &[Filter],
    ) -> Result<Option<f64>> {
        // 精確過濾最多只會回傳一筆，不需要翻頁
        let page = self.source.get_products(service_code, filters, None).await?;

        let Some(raw) = page.price_list.first() else {
            return Ok(None);
        };

        let record: PriceRecord = serde_json::from_str(raw)?;
        record.hourly_usd(instance_type).map(Some)
    }

    fn to_monthly(&self, instance_type: &str, hourly: f64, storage_gb: f64) -> f64 {
        let monthly = hourly * self.hours_per_month;
        let storage_cost = storage_gb * self.storage_rate;
        let total = monthly + storage_cost;

        tracing::info!(
            "💰 {}: unit {} USD/h, monthly {:.2}, storage {} GB at {} = {:.2}, total {:.2}",
            instance_type,
            hourly,
            monthly,
            storage_gb,
            self.storage_rate,
            storage_cost,
            total
        );

        total
    }
}
