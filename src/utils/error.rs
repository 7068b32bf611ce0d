use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed search response: {message}")]
    ParseError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("No columns selected for the search query")]
    NoColumnsSelected,

    #[error("Selected columns not present in dataset: {}", missing.join(", "))]
    UnknownColumns { missing: Vec<String> },

    #[error("Dataset already has image links ({populated} rows populated)")]
    AlreadyEnriched { populated: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Storage,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::HttpError(_) | EnrichError::ParseError { .. } => ErrorCategory::Network,
            EnrichError::CsvError(_) | EnrichError::SerializationError(_) => ErrorCategory::Data,
            EnrichError::IoError(_) => ErrorCategory::Storage,
            EnrichError::ConfigValidationError { .. }
            | EnrichError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EnrichError::EmptyDataset
            | EnrichError::NoColumnsSelected
            | EnrichError::UnknownColumns { .. }
            | EnrichError::AlreadyEnriched { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EnrichError::AlreadyEnriched { .. } => ErrorSeverity::Low,
            EnrichError::HttpError(_) | EnrichError::ParseError { .. } => ErrorSeverity::Medium,
            EnrichError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EnrichError::HttpError(_) | EnrichError::ParseError { .. } => {
                "Check network connectivity and retry; progress is kept between runs".to_string()
            }
            EnrichError::CsvError(_) => {
                "Make sure the input is a CSV file with a header row and the same number of fields on every line".to_string()
            }
            EnrichError::IoError(_) => {
                "Check that the input, output and state file paths exist and are writable".to_string()
            }
            EnrichError::SerializationError(_) => {
                "The saved progress file is unreadable; rerun with --fresh to start over".to_string()
            }
            EnrichError::ConfigValidationError { field, .. }
            | EnrichError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' setting in the configuration file", field)
            }
            EnrichError::EmptyDataset => "Supply a CSV file with at least one data row".to_string(),
            EnrichError::NoColumnsSelected => {
                "Pass --columns with one or more column names".to_string()
            }
            EnrichError::UnknownColumns { .. } => {
                "Pick column names exactly as they appear in the CSV header".to_string()
            }
            EnrichError::AlreadyEnriched { .. } => {
                "Use the enriched file as-is, or supply a fresh dataset to run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::AlreadyEnriched { .. } => {
                "Image links have already been added to this dataset.".to_string()
            }
            EnrichError::EmptyDataset => "The dataset is empty.".to_string(),
            EnrichError::NoColumnsSelected => "Select at least one column to search with.".to_string(),
            EnrichError::UnknownColumns { missing } => {
                format!("Unknown column(s): {}", missing.join(", "))
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
