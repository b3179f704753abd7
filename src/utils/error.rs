use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Parsing,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdError::IoError(_) => ErrorCategory::Io,
            AdError::SerializationError(_) | AdError::TomlError(_) => ErrorCategory::Parsing,
            AdError::MissingConfigError { .. }
            | AdError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AdError::StorageError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdError::MissingConfigError { .. } => ErrorSeverity::Medium,
            AdError::InvalidConfigValueError { .. } => ErrorSeverity::Medium,
            AdError::SerializationError(_) | AdError::TomlError(_) => ErrorSeverity::High,
            AdError::StorageError { .. } => ErrorSeverity::High,
            AdError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AdError::IoError(_) => "Check that the settings file and metadata directory exist and are readable",
            AdError::SerializationError(_) => "Check the JSON blobs in the settings for syntax errors",
            AdError::TomlError(_) => "Check the TOML settings file for syntax errors",
            AdError::MissingConfigError { .. } => "Add the missing option to the settings store",
            AdError::InvalidConfigValueError { .. } => "Correct the highlighted option value",
            AdError::StorageError { .. } => "Verify the storage backend is reachable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AdError::MissingConfigError { field } => {
                format!("The ad settings are missing '{}'", field)
            }
            AdError::InvalidConfigValueError { field, reason, .. } => {
                format!("The ad setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdError>;
