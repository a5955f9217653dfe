use crate::core::pricing::PriceRecord;
use crate::domain::model::{CatalogEntry, CatalogMap, Filter};
use crate::domain::ports::CatalogSource;
use crate::utils::error::Result;

/// Fetches every instance type the catalog lists for a service family in a
/// region, following pagination until exhausted. For database services the
/// listing is narrowed to one engine. Only instance families matching the
/// configured generation markers are retained.
pub async fn fetch_catalog<C: CatalogSource>(
    source: &C,
    service_code: &str,
    region: &str,
    engine_filter: Option<&str>,
    generation_markers: &[String],
) -> Result<CatalogMap> {
    let mut filters = vec![Filter::term("location", region)];
    if let Some(engine) = engine_filter {
        filters.push(Filter::term("databaseEngine", engine));
    }

    let mut catalog = CatalogMap::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = source
            .get_products(service_code, &filters, next_token.as_deref())
            .await?;

        tracing::debug!(
            "Catalog page for {}: {} records, more: {}",
            service_code,
            page.price_list.len(),
            page.next_token.is_some()
        );

        for raw in &page.price_list {
            let record: PriceRecord = serde_json::from_str(raw)?;
            let attributes = &record.product.attributes;

            let Some(instance_type) = attributes.get("instanceType") else {
                continue;
            };
            if !matches_generation(instance_type, generation_markers) {
                continue;
            }

            let vcpu = attributes
                .get("vcpu")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(0);
            let memory_gb = attributes
                .get("memory")
                .map(|m| parse_memory_gb(m))
                .unwrap_or(0.0);

            catalog.insert(
                instance_type.clone(),
                CatalogEntry {
                    instance_type: instance_type.clone(),
                    vcpu,
                    memory_gb,
                },
            );
        }

        next_token = page.next_token;
        if next_token.is_none() {
            break;
        }
    }

    tracing::info!(
        "📖 Fetched {} instance types for {}",
        catalog.len(),
        service_code
    );
    Ok(catalog)
}

/// Leading numeric token of a free-text memory string ("16 GiB" → 16.0).
/// Unparsable values degrade to zero instead of failing the fetch.
pub fn parse_memory_gb(raw: &str) -> f64 {
    raw.split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn matches_generation(instance_type: &str, markers: &[String]) -> bool {
    // 空清單代表不做世代過濾
    markers.is_empty() || markers.iter().any(|m| instance_type.contains(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ProductPage;
    use crate::utils::error::Result;
    use async_trait::async_trait;

    struct PagedCatalogSource {
        pages: Vec<ProductPage>,
    }

    #[async_trait]
    impl CatalogSource for PagedCatalogSource {
        async fn get_products(
            &self,
            _service_code: &str,
            _filters: &[Filter],
            next_token: Option<&str>,
        ) -> Result<ProductPage> {
            let index = next_token
                .map(|t| t.parse::<usize>().unwrap())
                .unwrap_or(0);
            Ok(self.pages[index].clone())
        }
    }

    fn catalog_record(instance_type: &str, vcpu: &str, memory: &str) -> String {
        serde_json::json!({
            "product": {
                "attributes": {
                    "instanceType": instance_type,
                    "vcpu": vcpu,
                    "memory": memory
                }
            }
        })
        .to_string()
    }

    fn markers() -> Vec<String> {
        vec!["5".to_string(), "6".to_string()]
    }

    #[tokio::test]
    async fn test_fetch_follows_pagination_to_exhaustion() {
        let source = PagedCatalogSource {
            pages: vec![
                ProductPage {
                    price_list: vec![catalog_record("m5.large", "2", "8 GiB")],
                    next_token: Some("1".to_string()),
                },
                ProductPage {
                    price_list: vec![catalog_record("m5.xlarge", "4", "16 GiB")],
                    next_token: Some("2".to_string()),
                },
                ProductPage {
                    price_list: vec![catalog_record("r6.large", "2", "16 GiB")],
                    next_token: None,
                },
            ],
        };

        let catalog = fetch_catalog(&source, "AmazonEC2", "US East (N. Virginia)", None, &markers())
            .await
            .unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains_key("m5.large"));
        assert!(catalog.contains_key("m5.xlarge"));
        assert!(catalog.contains_key("r6.large"));
    }

    #[tokio::test]
    async fn test_generation_markers_narrow_the_catalog() {
        let source = PagedCatalogSource {
            pages: vec![ProductPage {
                price_list: vec![
                    catalog_record("m4.large", "2", "8 GiB"),
                    catalog_record("m5.large", "2", "8 GiB"),
                    catalog_record("c6.xlarge", "4", "8 GiB"),
                    catalog_record("t3.micro", "2", "1 GiB"),
                ],
                next_token: None,
            }],
        };

        let catalog = fetch_catalog(&source, "AmazonEC2", "US East (N. Virginia)", None, &markers())
            .await
            .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains_key("m5.large"));
        assert!(catalog.contains_key("c6.xlarge"));
        assert!(!catalog.contains_key("m4.large"));
    }

    #[tokio::test]
    async fn test_empty_marker_list_disables_narrowing() {
        let source = PagedCatalogSource {
            pages: vec![ProductPage {
                price_list: vec![
                    catalog_record("m4.large", "2", "8 GiB"),
                    catalog_record("t3.micro", "2", "1 GiB"),
                ],
                next_token: None,
            }],
        };

        let catalog = fetch_catalog(&source, "AmazonEC2", "US East (N. Virginia)", None, &[])
            .await
            .unwrap();

        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_memory_and_vcpu_degrade_to_zero() {
        let source = PagedCatalogSource {
            pages: vec![ProductPage {
                price_list: vec![catalog_record("m5.metal", "variable", "Unknown")],
                next_token: None,
            }],
        };

        let catalog = fetch_catalog(&source, "AmazonEC2", "US East (N. Virginia)", None, &markers())
            .await
            .unwrap();

        let entry = &catalog["m5.metal"];
        assert_eq!(entry.vcpu, 0);
        assert_eq!(entry.memory_gb, 0.0);
    }

    #[test]
    fn test_parse_memory_gb() {
        assert_eq!(parse_memory_gb("16 GiB"), 16.0);
        assert_eq!(parse_memory_gb("3.75 GiB"), 3.75);
        assert_eq!(parse_memory_gb("Unknown"), 0.0);
        assert_eq!(parse_memory_gb(""), 0.0);
    }
}
