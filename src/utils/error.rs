use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV rendering error: {0}")]
    CsvError(#[from] csv::Error),

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

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not authorized to call {endpoint}")]
    Unauthorized { endpoint: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    ApiStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Endpoint {endpoint} is disabled")]
    EndpointDisabled { endpoint: String },

    #[error("Access token has expired")]
    TokenExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Api,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConnectorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) => ErrorCategory::Network,
            Self::IoError(_) => ErrorCategory::System,
            Self::SerializationError(_) | Self::CsvError(_) | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::EndpointDisabled { .. } => ErrorCategory::Configuration,
            Self::Unauthorized { .. } | Self::TokenExpired => ErrorCategory::Authentication,
            Self::ApiStatus { .. } => ErrorCategory::Api,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Http(_) => ErrorSeverity::Medium,
            Self::ApiStatus { status, .. } if *status >= 500 || *status == 429 => {
                ErrorSeverity::Medium
            }
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Http(_) => "Check the network connection and that the API host is reachable",
            Self::IoError(_) => "Check file permissions and available disk space",
            Self::SerializationError(_) => {
                "The API response did not have the expected shape; rerun with --verbose"
            }
            Self::CsvError(_) => "Try another output format",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file or CLI arguments",
            Self::ValidationError { .. } => "Check the arguments passed to the command",
            Self::Unauthorized { .. } | Self::TokenExpired => {
                "Log in again in the MySkoda app flow and update the access token"
            }
            Self::ApiStatus { status, .. } if *status >= 500 => {
                "The vendor API is having trouble; try again later"
            }
            Self::ApiStatus { .. } => "Check that the VIN belongs to this account",
            Self::EndpointDisabled { .. } => {
                "Set allow_disabled_endpoints = true if you really want to call it"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Http(_) => "Could not reach the MySkoda API".to_string(),
            Self::Unauthorized { endpoint } => {
                format!("The API rejected the credentials for {}", endpoint)
            }
            Self::TokenExpired => "The configured access token has expired".to_string(),
            other => other.to_string(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
