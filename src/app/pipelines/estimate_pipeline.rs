use crate::config::EstimateConfig;
use crate::core::catalog::fetch_catalog;
use crate::core::matcher::{match_instance, MatchedInstance, PriceRequest};
use crate::core::pricing::PriceResolver;
use crate::domain::model::{
    DeploymentOption, EnvironmentClass, EstimateResult, PriceQuote, ServerRequirement,
    ServiceKind, SourceData,
};
use crate::domain::ports::{CatalogSource, Pipeline, Storage};
use crate::utils::error::{EstimateError, Result};
use comfy_table::Table;
use std::collections::HashMap;

const REPORT_HEADERS: [&str; 9] = [
    "ID",
    "Environment",
    "InstanceType",
    "Service",
    "DeploymentOption",
    "PricePerMonth",
    "NumberOfCores",
    "TotalMemoryInGB",
    "StorageGB",
];

/// 估價管道：讀取清單、抓取目錄、配對並輸出報表
pub struct EstimatePipeline<S: Storage, C: CatalogSource> {
    pub(crate) storage: S,
    pub(crate) source: C,
    pub(crate) config: EstimateConfig,
}

impl<S: Storage, C: CatalogSource> EstimatePipeline<S, C> {
    pub fn new(storage: S, source: C, config: EstimateConfig) -> Self {
        Self {
            storage,
            source,
            config,
        }
    }

    fn resolver(&self) -> PriceResolver<'_, C> {
        PriceResolver::new(
            &self.source,
            &self.config.pricing.region,
            self.config.costing.hours_per_month,
            self.config.costing.storage_rate_per_gb_month,
        )
    }

    fn quote(
        &self,
        row: &ServerRequirement,
        matched: &MatchedInstance,
        kind: &ServiceKind,
        deployment: DeploymentOption,
    ) -> PriceQuote {
        PriceQuote {
            id: row.id.clone(),
            environment: row.environment.clone(),
            instance_type: matched.instance_type.clone(),
            service: kind.label(
                &self.config.services.compute_label,
                &self.config.services.database_label,
            ),
            deployment_option: deployment,
            price_per_month: matched.price_per_month,
            vcpu: row.vcpu,
            memory_gb: row.memory_gb,
            storage_gb: row.storage_gb,
        }
    }

    /// Prices one inventory row against compute and every configured
    /// database engine. Returns how many quotes it appended.
    async fn price_row(
        &self,
        row: &ServerRequirement,
        class: EnvironmentClass,
        data: &SourceData,
        quotes: &mut Vec<PriceQuote>,
    ) -> Result<usize> {
        let resolver = self.resolver();
        let deployment = class.deployment_option();
        let mut emitted = 0;

        let compute_match = match_instance(
            &data.compute_catalog,
            row.vcpu,
            row.memory_gb,
            &resolver,
            &self.config.services.compute_code,
            PriceRequest::Compute,
            row.storage_gb,
        )
        .await?;

        match compute_match {
            Some(matched) => {
                quotes.push(self.quote(row, &matched, &ServiceKind::Compute, deployment));
                emitted += 1;
            }
            None => tracing::warn!(
                "No priced compute instance for row {} (vCPU: {}, Memory: {})",
                row.id,
                row.vcpu,
                row.memory_gb
            ),
        }

        for engine in &self.config.services.database_engines {
            let Some(catalog) = data.database_catalogs.get(engine) else {
                continue;
            };

            let database_match = match_instance(
                catalog,
                row.vcpu,
                row.memory_gb,
                &resolver,
                &self.config.services.database_code,
                PriceRequest::Database {
                    engine: engine.as_str(),
                    deployment,
                },
                row.storage_gb,
            )
            .await?;

            match database_match {
                Some(matched) => {
                    let kind = ServiceKind::Database {
                        engine: engine.clone(),
                    };
                    quotes.push(self.quote(row, &matched, &kind, deployment));
                    emitted += 1;
                }
                None => tracing::warn!(
                    "No priced database instance for row {} engine {} (vCPU: {}, Memory: {})",
                    row.id,
                    engine,
                    row.vcpu,
                    row.memory_gb
                ),
            }
        }

        Ok(emitted)
    }

    fn render_table(&self, quotes: &[PriceQuote], delimiter: u8) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(vec![]);

        // 先寫表頭，零筆結果時檔案仍然有欄位列
        writer.write_record(REPORT_HEADERS)?;
        for quote in quotes {
            writer.serialize(quote)?;
        }

        writer
            .into_inner()
            .map_err(|e| EstimateError::ProcessingError {
                message: format!("CSV buffer error: {}", e),
            })
    }

    fn print_summary(&self, result: &EstimateResult) {
        println!();
        println!(
            "Prices per month (generated {}):",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let mut table = Table::new();
        table.set_header(vec![
            "ID",
            "Environment",
            "Instance",
            "Service",
            "Deployment",
            "USD/month",
        ]);
        for quote in &result.quotes {
            table.add_row(vec![
                quote.id.clone(),
                quote.environment.clone(),
                quote.instance_type.clone(),
                quote.service.clone(),
                quote.deployment_option.to_string(),
                format!("{:.2}", quote.price_per_month),
            ]);
        }
        println!("{table}");

        let total: f64 = result.quotes.iter().map(|q| q.price_per_month).sum();
        println!(
            "Total estimated: {:.2} USD/month ({} recommendations, {} unmatched rows)",
            total,
            result.quotes.len(),
            result.unmatched_ids.len()
        );
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: CatalogSource> Pipeline for EstimatePipeline<S, C> {
    async fn extract(&self) -> Result<SourceData> {
        tracing::info!("🚀 Loading inventory from: {}", self.config.inventory.path);

        let raw = self.storage.read_file(&self.config.inventory.path).await?;
        let mut reader = csv::Reader::from_reader(raw.as_slice());
        let mut inventory = Vec::new();
        for row in reader.deserialize() {
            let requirement: ServerRequirement = row?;
            inventory.push(requirement);
        }
        tracing::info!("📋 Loaded {} inventory rows", inventory.len());

        let markers = &self.config.matching.generation_markers;
        let region = &self.config.pricing.region;

        let compute_catalog = fetch_catalog(
            &self.source,
            &self.config.services.compute_code,
            region,
            None,
            markers,
        )
        .await?;

        let mut database_catalogs = HashMap::new();
        for engine in &self.config.services.database_engines {
            let catalog = fetch_catalog(
                &self.source,
                &self.config.services.database_code,
                region,
                Some(engine),
                markers,
            )
            .await?;
            database_catalogs.insert(engine.clone(), catalog);
        }

        Ok(SourceData {
            inventory,
            compute_catalog,
            database_catalogs,
        })
    }

    async fn transform(&self, data: SourceData) -> Result<EstimateResult> {
        // 依環境分組，組內保持清單順序
        let mut non_prod = Vec::new();
        let mut prod = Vec::new();
        for row in &data.inventory {
            match EnvironmentClass::classify(&row.environment) {
                Some(EnvironmentClass::NonProduction) => non_prod.push(row),
                Some(EnvironmentClass::Production) => prod.push(row),
                None => tracing::warn!(
                    "Row {}: environment '{}' matches neither group, excluded",
                    row.id,
                    row.environment
                ),
            }
        }

        let mut quotes = Vec::new();
        let mut unmatched_ids = Vec::new();

        let groups = [
            (EnvironmentClass::NonProduction, non_prod),
            (EnvironmentClass::Production, prod),
        ];
        for (class, rows) in groups {
            for row in rows {
                let emitted = self.price_row(row, class, &data, &mut quotes).await?;
                if emitted == 0 {
                    tracing::warn!("Row {} produced no priced recommendation", row.id);
                    unmatched_ids.push(row.id.clone());
                }
            }
        }

        Ok(EstimateResult {
            quotes,
            unmatched_ids,
        })
    }

    async fn load(&self, result: EstimateResult) -> Result<String> {
        let output_path = self.config.output_path();
        let primary = format!("{}/{}", output_path, self.config.csv_filename());

        if self.config.wants_format("csv") {
            let csv_bytes = self.render_table(&result.quotes, b',')?;
            tracing::debug!("Writing CSV report ({} bytes)", csv_bytes.len());
            self.storage.write_file(&primary, &csv_bytes).await?;
        }

        if self.config.wants_format("tsv") {
            let tsv_bytes = self.render_table(&result.quotes, b'\t')?;
            let tsv_path = format!("{}/{}", output_path, self.config.tsv_filename());
            tracing::debug!("Writing TSV report ({} bytes)", tsv_bytes.len());
            self.storage.write_file(&tsv_path, &tsv_bytes).await?;
        }

        self.print_summary(&result);
        Ok(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Filter, ProductPage};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<AsyncMutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(AsyncMutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EstimateError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    /// One record per instance type, carrying both catalog attributes and
    /// (when priced) on-demand terms. Catalog fetches (no instanceType
    /// filter) return all records of the service; price queries return the
    /// one record asked for, when it has terms.
    struct MockCatalog {
        records: HashMap<String, Vec<(String, serde_json::Value)>>,
    }

    impl MockCatalog {
        fn new() -> Self {
            Self {
                records: HashMap::new(),
            }
        }

        fn with_instance(
            mut self,
            service_code: &str,
            instance_type: &str,
            vcpu: u32,
            memory: &str,
            hourly: Option<&str>,
        ) -> Self {
            let mut record = serde_json::json!({
                "product": {
                    "attributes": {
                        "instanceType": instance_type,
                        "vcpu": vcpu.to_string(),
                        "memory": memory
                    }
                }
            });
            if let Some(hourly) = hourly {
                record["terms"] = serde_json::json!({
                    "OnDemand": {
                        "T": {
                            "priceDimensions": {
                                "D": { "pricePerUnit": { "USD": hourly }, "unit": "Hrs" }
                            }
                        }
                    }
                });
            }
            self.records
                .entry(service_code.to_string())
                .or_default()
                .push((instance_type.to_string(), record));
            self
        }
    }

    #[async_trait]
    impl CatalogSource for MockCatalog {
        async fn get_products(
            &self,
            service_code: &str,
            filters: &[Filter],
            _next_token: Option<&str>,
        ) -> Result<ProductPage> {
            let records = self.records.get(service_code).cloned().unwrap_or_default();
            let wanted = filters
                .iter()
                .find(|f| f.field == "instanceType")
                .map(|f| f.value.clone());

            let price_list = match wanted {
                Some(instance_type) => records
                    .into_iter()
                    .filter(|(name, record)| *name == instance_type && record.get("terms").is_some())
                    .map(|(_, record)| record.to_string())
                    .collect(),
                None => records
                    .into_iter()
                    .map(|(_, record)| record.to_string())
                    .collect(),
            };

            Ok(ProductPage {
                price_list,
                next_token: None,
            })
        }
    }

    const INVENTORY_CSV: &str = "\
ID,Environment,NumberOfCores,TotalMemoryInGB,StorageGB
1,PROD,4,16,100
2,DEV-TEST,2,8,50
3,STAGING,2,8,50
";

    fn full_catalog() -> MockCatalog {
        MockCatalog::new()
            .with_instance("AmazonEC2", "m5.large", 2, "8 GiB", Some("0.10"))
            .with_instance("AmazonEC2", "m5.xlarge", 4, "16 GiB", Some("0.20"))
            .with_instance("AmazonRDS", "db.m5.large", 2, "8 GiB", Some("0.25"))
            .with_instance("AmazonRDS", "db.m5.xlarge", 4, "16 GiB", Some("0.50"))
    }

    async fn pipeline_with(
        catalog: MockCatalog,
    ) -> EstimatePipeline<MockStorage, MockCatalog> {
        let storage = MockStorage::new();
        storage
            .put_file("server_list.csv", INVENTORY_CSV.as_bytes())
            .await;
        EstimatePipeline::new(storage, catalog, EstimateConfig::default())
    }

    #[tokio::test]
    async fn test_extract_reads_inventory_and_catalogs() {
        let pipeline = pipeline_with(full_catalog()).await;

        let data = pipeline.extract().await.unwrap();

        assert_eq!(data.inventory.len(), 3);
        assert_eq!(data.inventory[0].id, "1");
        assert_eq!(data.inventory[0].vcpu, 4);
        assert_eq!(data.inventory[0].memory_gb, 16.0);
        assert_eq!(data.compute_catalog.len(), 2);
        assert_eq!(data.database_catalogs["SQL Server"].len(), 2);
    }

    #[tokio::test]
    async fn test_transform_prices_and_partitions_rows() {
        let pipeline = pipeline_with(full_catalog()).await;
        let data = pipeline.extract().await.unwrap();

        let result = pipeline.transform(data).await.unwrap();

        // Non-production first, then production; STAGING excluded.
        assert_eq!(result.quotes.len(), 4);
        assert_eq!(result.quotes[0].id, "2");
        assert_eq!(result.quotes[0].service, "EC2");
        assert_eq!(result.quotes[0].instance_type, "m5.large");
        assert_eq!(result.quotes[0].deployment_option, DeploymentOption::SingleAz);
        assert_eq!(result.quotes[1].id, "2");
        assert_eq!(result.quotes[1].service, "RDS (SQL Server)");

        assert_eq!(result.quotes[2].id, "1");
        assert_eq!(result.quotes[2].instance_type, "m5.xlarge");
        assert_eq!(result.quotes[2].deployment_option, DeploymentOption::MultiAz);
        // 0.20 * 730 + 100 * 0.115
        assert_eq!(result.quotes[2].price_per_month, 157.5);
        assert_eq!(result.quotes[3].service, "RDS (SQL Server)");

        assert!(result.quotes.iter().all(|q| q.id != "3"));
        assert!(result.unmatched_ids.is_empty());
    }

    #[tokio::test]
    async fn test_rows_exceeding_catalog_produce_no_quotes() {
        // Catalog only carries 2-core instances, so the 4/16 PROD row
        // cannot be matched for either service.
        let catalog = MockCatalog::new()
            .with_instance("AmazonEC2", "m5.large", 2, "8 GiB", Some("0.10"))
            .with_instance("AmazonRDS", "db.m5.large", 2, "8 GiB", Some("0.25"));
        let pipeline = pipeline_with(catalog).await;
        let data = pipeline.extract().await.unwrap();

        let result = pipeline.transform(data).await.unwrap();

        assert_eq!(result.quotes.len(), 2);
        assert!(result.quotes.iter().all(|q| q.id == "2"));
        assert_eq!(result.unmatched_ids, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_unpriced_smaller_candidate_is_skipped() {
        let catalog = MockCatalog::new()
            .with_instance("AmazonEC2", "m5.large", 2, "8 GiB", None)
            .with_instance("AmazonEC2", "m5.xlarge", 4, "16 GiB", Some("0.20"))
            .with_instance("AmazonRDS", "db.m5.large", 2, "8 GiB", Some("0.25"))
            .with_instance("AmazonRDS", "db.m5.xlarge", 4, "16 GiB", Some("0.50"));
        let pipeline = pipeline_with(catalog).await;
        let data = pipeline.extract().await.unwrap();

        let result = pipeline.transform(data).await.unwrap();

        let dev_compute = result
            .quotes
            .iter()
            .find(|q| q.id == "2" && q.service == "EC2")
            .unwrap();
        assert_eq!(dev_compute.instance_type, "m5.xlarge");
    }

    #[tokio::test]
    async fn test_load_writes_csv_with_headers() {
        let pipeline = pipeline_with(full_catalog()).await;
        let data = pipeline.extract().await.unwrap();
        let result = pipeline.transform(data).await.unwrap();

        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "./output/pricing_output.csv");
        let csv_bytes = pipeline
            .storage
            .get_file("./output/pricing_output.csv")
            .await
            .unwrap();
        let content = String::from_utf8(csv_bytes).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(
            lines[0],
            "ID,Environment,InstanceType,Service,DeploymentOption,PricePerMonth,NumberOfCores,TotalMemoryInGB,StorageGB"
        );
        assert_eq!(lines.len(), 5);
        assert!(lines[3].starts_with("1,PROD,m5.xlarge,EC2,Multi-AZ,157.5,4,16"));
    }

    #[tokio::test]
    async fn test_load_with_no_quotes_still_writes_header_row() {
        let pipeline = pipeline_with(full_catalog()).await;

        let result = EstimateResult {
            quotes: vec![],
            unmatched_ids: vec!["1".to_string()],
        };
        pipeline.load(result).await.unwrap();

        let csv_bytes = pipeline
            .storage
            .get_file("./output/pricing_output.csv")
            .await
            .unwrap();
        let content = String::from_utf8(csv_bytes).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("ID,Environment,"));
    }
}
