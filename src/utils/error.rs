use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Narrative request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Reference catalog error: {message}")]
    CatalogError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Narrative service error: {message}")]
    NarrativeError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ReferenceData,
    Io,
    Export,
    External,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::CatalogError { .. } => ErrorCategory::ReferenceData,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::ZipError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Export
            }
            EtlError::ApiError(_) | EtlError::NarrativeError { .. } => ErrorCategory::External,
            EtlError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 敘述服務失敗不影響檢驗結果
            ErrorCategory::External => ErrorSeverity::Low,
            ErrorCategory::Io => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Export | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
            ErrorCategory::ReferenceData => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line arguments or the TOML configuration file"
            }
            ErrorCategory::ReferenceData => {
                "Check the catalog items for duplicate names and inverted reference ranges"
            }
            ErrorCategory::Io => "Make sure the input files exist and the output path is writable",
            ErrorCategory::Export => "Check free disk space and the requested output formats",
            ErrorCategory::External => "Check the narrative endpoint or run without it",
            ErrorCategory::Processing => "Re-run with --verbose to see which document failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "An input report could not be found".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Please provide a value for '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("The setting '{}' is not valid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

/// 透析充分性計算失敗的原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputationError {
    #[error("division by zero")]
    DivideByZero,

    #[error("logarithm argument is not positive")]
    LogDomainError,
}
