use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("Catalog API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Catalog API returned status {status} for {endpoint}")]
    ApiStatusError { status: u16, endpoint: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed price record for {instance_type}: {reason}")]
    MalformedPriceRecord {
        instance_type: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

impl EstimateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EstimateError::ApiError(_) | EstimateError::ApiStatusError { .. } => {
                ErrorCategory::Network
            }
            EstimateError::CsvError(_)
            | EstimateError::SerializationError(_)
            | EstimateError::MalformedPriceRecord { .. }
            | EstimateError::ProcessingError { .. } => ErrorCategory::Data,
            EstimateError::ConfigValidationError { .. }
            | EstimateError::InvalidConfigValueError { .. }
            | EstimateError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EstimateError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EstimateError::ApiError(_)
            | EstimateError::ApiStatusError { .. }
            | EstimateError::MalformedPriceRecord { .. } => ErrorSeverity::Medium,
            EstimateError::CsvError(_)
            | EstimateError::SerializationError(_)
            | EstimateError::ProcessingError { .. }
            | EstimateError::ConfigValidationError { .. }
            | EstimateError::InvalidConfigValueError { .. }
            | EstimateError::MissingConfigError { .. } => ErrorSeverity::High,
            EstimateError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EstimateError::ApiError(_) => {
                "Check network connectivity and the pricing endpoint URL, then rerun".to_string()
            }
            EstimateError::ApiStatusError { .. } => {
                "Verify the endpoint, auth headers and region in the config file".to_string()
            }
            EstimateError::CsvError(_) => {
                "Check that the inventory file has the expected columns (ID, Environment, NumberOfCores, TotalMemoryInGB, StorageGB)".to_string()
            }
            EstimateError::IoError(_) => {
                "Check file paths and permissions for the inventory and output directories"
                    .to_string()
            }
            EstimateError::SerializationError(_) => {
                "The catalog response did not match the provider schema; rerun with --verbose to inspect it".to_string()
            }
            EstimateError::MalformedPriceRecord { .. } => {
                "The provider returned a product without a usable on-demand price dimension"
                    .to_string()
            }
            EstimateError::ConfigValidationError { .. }
            | EstimateError::InvalidConfigValueError { .. }
            | EstimateError::MissingConfigError { .. } => {
                "Fix the configuration file and rerun (see estimate-config.toml for a template)"
                    .to_string()
            }
            EstimateError::ProcessingError { .. } => {
                "Rerun with --verbose to locate the offending inventory row".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the pricing catalog: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;
