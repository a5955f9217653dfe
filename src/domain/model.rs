use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// One instance offering retained from a catalog fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub instance_type: String,
    pub vcpu: u32,
    pub memory_gb: f64,
}

pub type CatalogMap = HashMap<String, CatalogEntry>;

/// 伺服器清單的一列（CSV 欄位名沿用原始報表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRequirement {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Environment")]
    pub environment: String,
    #[serde(rename = "NumberOfCores")]
    pub vcpu: u32,
    #[serde(rename = "TotalMemoryInGB")]
    pub memory_gb: f64,
    #[serde(rename = "StorageGB")]
    pub storage_gb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentClass {
    NonProduction,
    Production,
}

impl EnvironmentClass {
    /// Non-production labels contain preprod/dev/test (case-insensitive);
    /// production labels are exactly "prod". Anything else is unclassified.
    pub fn classify(label: &str) -> Option<EnvironmentClass> {
        let lower = label.to_lowercase();
        if ["preprod", "dev", "test"].iter().any(|m| lower.contains(m)) {
            Some(EnvironmentClass::NonProduction)
        } else if lower == "prod" {
            Some(EnvironmentClass::Production)
        } else {
            None
        }
    }

    pub fn deployment_option(&self) -> DeploymentOption {
        match self {
            EnvironmentClass::NonProduction => DeploymentOption::SingleAz,
            EnvironmentClass::Production => DeploymentOption::MultiAz,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentOption {
    SingleAz,
    MultiAz,
}

impl DeploymentOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentOption::SingleAz => "Single-AZ",
            DeploymentOption::MultiAz => "Multi-AZ",
        }
    }
}

impl std::fmt::Display for DeploymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeploymentOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Which catalog service a quote was priced against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    Compute,
    Database { engine: String },
}

impl ServiceKind {
    /// Report label, e.g. "EC2" or "RDS (SQL Server)".
    pub fn label(&self, compute_label: &str, database_label: &str) -> String {
        match self {
            ServiceKind::Compute => compute_label.to_string(),
            ServiceKind::Database { engine } => format!("{} ({})", database_label, engine),
        }
    }
}

/// One successfully priced recommendation; a server may yield zero, one or
/// two of these (compute and/or database).
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Environment")]
    pub environment: String,
    #[serde(rename = "InstanceType")]
    pub instance_type: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "DeploymentOption")]
    pub deployment_option: DeploymentOption,
    #[serde(rename = "PricePerMonth")]
    pub price_per_month: f64,
    #[serde(rename = "NumberOfCores")]
    pub vcpu: u32,
    #[serde(rename = "TotalMemoryInGB")]
    pub memory_gb: f64,
    #[serde(rename = "StorageGB")]
    pub storage_gb: f64,
}

/// Exact-match attribute filter sent to the catalog API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn term(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// One page of catalog results; `price_list` entries are JSON-encoded
/// product records exactly as the provider returns them.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub price_list: Vec<String>,
    pub next_token: Option<String>,
}

/// Extract 階段的輸出：清單 + 各服務的目錄
#[derive(Debug, Clone)]
pub struct SourceData {
    pub inventory: Vec<ServerRequirement>,
    pub compute_catalog: CatalogMap,
    /// One narrowed catalog per configured database engine.
    pub database_catalogs: HashMap<String, CatalogMap>,
}

/// Transform 階段的輸出
#[derive(Debug, Clone)]
pub struct EstimateResult {
    pub quotes: Vec<PriceQuote>,
    pub unmatched_ids: Vec<String>,
}
