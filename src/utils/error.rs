use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CMS returned {status} for '{resource}'")]
    ApiStatusError {
        status: reqwest::StatusCode,
        resource: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Not found: {resource}")]
    NotFoundError { resource: String },
}

impl CatalogError {
    /// 給終端使用者看的錯誤訊息（不含技術細節）
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError(_) | Self::ApiStatusError { .. } => {
                "The cocktail catalog is unreachable right now. Please try again later.".to_string()
            }
            Self::SerializationError(_) => {
                "The catalog returned data we could not understand.".to_string()
            }
            Self::IoError(_) => "A local file could not be read or written.".to_string(),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            Self::NotFoundError { resource } => format!("'{}' was not found", resource),
        }
    }

    /// 網路層錯誤可以降級為空結果，設定錯誤不行
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::ApiError(_) | Self::ApiStatusError { .. } | Self::SerializationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
