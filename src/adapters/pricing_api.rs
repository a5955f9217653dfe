use crate::domain::model::{Filter, ProductPage};
use crate::domain::ports::CatalogSource;
use crate::utils::error::{EstimateError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GetProductsRequest<'a> {
    #[serde(rename = "ServiceCode")]
    service_code: &'a str,
    #[serde(rename = "Filters")]
    filters: Vec<WireFilter<'a>>,
    #[serde(rename = "NextToken", skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireFilter<'a> {
    #[serde(rename = "Type")]
    kind: &'a str,
    #[serde(rename = "Field")]
    field: &'a str,
    #[serde(rename = "Value")]
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetProductsResponse {
    #[serde(rename = "PriceList", default)]
    price_list: Vec<String>,
    #[serde(rename = "NextToken", default)]
    next_token: Option<String>,
}

/// HTTP implementation of the catalog port. Auth and any other
/// provider-specific headers come from configuration; the adapter itself
/// only knows the request/response shape.
pub struct HttpCatalogSource {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpCatalogSource {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Some(Duration::from_secs(seconds));
        self
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn get_products(
        &self,
        service_code: &str,
        filters: &[Filter],
        next_token: Option<&str>,
    ) -> Result<ProductPage> {
        let body = GetProductsRequest {
            service_code,
            filters: filters
                .iter()
                .map(|f| WireFilter {
                    kind: "TERM_MATCH",
                    field: &f.field,
                    value: &f.value,
                })
                .collect(),
            next_token,
        };

        // 構建請求
        let mut request = self.client.post(&self.endpoint).json(&body);

        // 添加自定義標頭
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        // 設定超時
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(
            "Catalog request to {} for {} ({} filters)",
            self.endpoint,
            service_code,
            filters.len()
        );

        let response = request.send().await?;
        tracing::debug!("Catalog response status: {}", response.status());

        if !response.status().is_success() {
            return Err(EstimateError::ApiStatusError {
                status: response.status().as_u16(),
                endpoint: self.endpoint.clone(),
            });
        }

        let decoded: GetProductsResponse = response.json().await?;
        Ok(ProductPage {
            price_list: decoded.price_list,
            next_token: decoded.next_token,
        })
    }
}
