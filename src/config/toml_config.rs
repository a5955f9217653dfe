use crate::utils::error::{EstimateError, Result};
use crate::utils::validation::{
    validate_non_empty_list, validate_non_empty_string, validate_path, validate_positive,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Estimate run configuration. Every policy constant of the core lives
/// here: endpoint and catalog region, service codes, engines, generation
/// markers, the hours-per-month constant and the flat storage rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateConfig {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub costing: CostingConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub endpoint: String,
    /// Catalog location string, e.g. "US East (N. Virginia)". The catalog
    /// metadata service itself lives behind `endpoint`; this value only
    /// selects which location's offerings are listed.
    pub region: String,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.pricing.us-east-1.amazonaws.com/".to_string(),
            region: "US East (N. Virginia)".to_string(),
            timeout_seconds: None,
            headers: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub compute_code: String,
    pub compute_label: String,
    pub database_code: String,
    pub database_label: String,
    pub database_engines: Vec<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            compute_code: "AmazonEC2".to_string(),
            compute_label: "EC2".to_string(),
            database_code: "AmazonRDS".to_string(),
            database_label: "RDS".to_string(),
            database_engines: vec!["SQL Server".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Instance families are narrowed to names containing one of these
    /// markers. An empty list keeps everything. Which generations to keep
    /// is a product decision, not something the matcher hard-codes.
    pub generation_markers: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            generation_markers: vec!["5".to_string(), "6".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostingConfig {
    pub hours_per_month: f64,
    pub storage_rate_per_gb_month: f64,
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self {
            hours_per_month: 730.0,
            storage_rate_per_gb_month: 0.115,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub path: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: "server_list.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub csv_filename: Option<String>,
    pub tsv_filename: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            formats: vec!["csv".to_string()],
            csv_filename: None,
            tsv_filename: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            services: ServicesConfig::default(),
            matching: MatchingConfig::default(),
            costing: CostingConfig::default(),
            inventory: InventoryConfig::default(),
            output: OutputConfig::default(),
            monitoring: None,
        }
    }
}

impl EstimateConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EstimateError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EstimateError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.output.formats.iter().any(|f| f == format)
    }

    pub fn csv_filename(&self) -> &str {
        self.output
            .csv_filename
            .as_deref()
            .unwrap_or("pricing_output.csv")
    }

    pub fn tsv_filename(&self) -> &str {
        self.output
            .tsv_filename
            .as_deref()
            .unwrap_or("pricing_output.tsv")
    }
}

impl Validate for EstimateConfig {
    fn validate(&self) -> Result<()> {
        validate_url("pricing.endpoint", &self.pricing.endpoint)?;
        validate_non_empty_string("pricing.region", &self.pricing.region)?;

        validate_non_empty_string("services.compute_code", &self.services.compute_code)?;
        validate_non_empty_string("services.compute_label", &self.services.compute_label)?;
        validate_non_empty_string("services.database_code", &self.services.database_code)?;
        validate_non_empty_string("services.database_label", &self.services.database_label)?;
        validate_non_empty_list("services.database_engines", &self.services.database_engines)?;

        validate_positive("costing.hours_per_month", self.costing.hours_per_month)?;
        let rate = self.costing.storage_rate_per_gb_month;
        if !rate.is_finite() || rate < 0.0 {
            return Err(EstimateError::InvalidConfigValueError {
                field: "costing.storage_rate_per_gb_month".to_string(),
                value: rate.to_string(),
                reason: "Rate must be zero or a positive number".to_string(),
            });
        }

        validate_path("inventory.path", &self.inventory.path)?;
        validate_path("output.path", &self.output.path)?;

        if self.output.formats.is_empty() {
            return Err(EstimateError::MissingConfigError {
                field: "output.formats".to_string(),
            });
        }
        for format in &self.output.formats {
            if format != "csv" && format != "tsv" {
                return Err(EstimateError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: format.clone(),
                    reason: "Supported formats are csv and tsv".to_string(),
                });
            }
        }

        Ok(())
    }
}
