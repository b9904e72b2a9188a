use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Redis operation failed: {0}")]
    StoreError(#[from] redis::RedisError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Stream endpoint returned HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("Stream error: {message}")]
    StreamError { message: String },

    #[error("Request signing failed: {message}")]
    SignatureError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

impl AppError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingConfigError { .. }
                | AppError::InvalidConfigValueError { .. }
                | AppError::ConfigValidationError { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AppError::MissingConfigError { field } => format!(
                "Set {} via its command line flag, environment variable or the TOML config file",
                field
            ),
            AppError::InvalidConfigValueError { field, .. } => {
                format!("Check the value configured for {}", field)
            }
            AppError::ConfigValidationError { .. } => {
                "Make sure the config file exists and is valid TOML".to_string()
            }
            AppError::StoreError(_) => {
                "Check that Redis is running and the configured redis URL is reachable".to_string()
            }
            AppError::HttpStatusError { status: 401, .. } => {
                "Check the consumer key/secret and access token/secret".to_string()
            }
            AppError::HttpStatusError { status: 420 | 429, .. } => {
                "Too many connection attempts; the stream will back off before reconnecting"
                    .to_string()
            }
            AppError::ApiError(_) | AppError::HttpStatusError { .. } | AppError::StreamError { .. } => {
                "Check network connectivity to the stream endpoint".to_string()
            }
            AppError::SignatureError { .. } => "Check the configured credentials".to_string(),
            AppError::IoError(_) => {
                "Re-run with --verbose for more detail".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::MissingConfigError { field } => format!("缺少必要設定: {}", field),
            AppError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值錯誤 {}: {}", field, reason)
            }
            AppError::ConfigValidationError { message, .. } => format!("設定檔錯誤: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_classified() {
        let missing = AppError::MissingConfigError {
            field: "consumer_key".to_string(),
        };
        assert!(missing.is_config_error());
        assert!(missing.recovery_suggestion().contains("consumer_key"));

        let status = AppError::HttpStatusError {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert!(!status.is_config_error());
        assert!(status.recovery_suggestion().contains("consumer key"));
    }
}
