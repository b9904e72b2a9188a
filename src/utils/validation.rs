use crate::utils::error::{AppError, Result};
use url::Url;

/// Twitter 對單一 track 片語的長度上限
pub const MAX_TRACK_BYTES: usize = 60;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    validate_scheme(field_name, url_str, &["http", "https"])
}

pub fn validate_redis_url(field_name: &str, url_str: &str) -> Result<()> {
    validate_scheme(field_name, url_str, &["redis", "rediss", "unix", "redis+unix"])
}

fn validate_scheme(field_name: &str, url_str: &str, allowed: &[&str]) -> Result<()> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) if allowed.contains(&url.scheme()) => Ok(()),
        Ok(url) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!(
                "Unsupported URL scheme: {}. Allowed schemes: {}",
                url.scheme(),
                allowed.join(", ")
            ),
        }),
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| AppError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_max_len(field_name: &str, value: &str, max_bytes: usize) -> Result<()> {
    if value.len() > max_bytes {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at most {} bytes", max_bytes),
        });
    }
    Ok(())
}

/// 設定檔中未被替換的 `${VAR}` 會原樣留下，不可當成真正的值
pub fn validate_no_env_placeholder(field_name: &str, value: &str) -> Result<()> {
    let unresolved = value
        .find("${")
        .is_some_and(|start| value[start + 2..].contains('}'));
    if unresolved {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Unresolved environment variable placeholder; export the variable or set the value directly".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("stream.endpoint", "https://stream.twitter.com").is_ok());
        assert!(validate_url("stream.endpoint", "http://127.0.0.1:8080/filter").is_ok());
        assert!(validate_url("stream.endpoint", "").is_err());
        assert!(validate_url("stream.endpoint", "invalid-url").is_err());
        assert!(validate_url("stream.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_redis_url() {
        assert!(validate_redis_url("store.redis_url", "redis://127.0.0.1:6379/").is_ok());
        assert!(validate_redis_url("store.redis_url", "rediss://cache.example.com").is_ok());
        assert!(validate_redis_url("store.redis_url", "https://cache.example.com").is_err());
    }

    #[test]
    fn test_validate_track() {
        assert!(validate_non_empty_string("stream.track", "Thanks Obama").is_ok());
        assert!(validate_non_empty_string("stream.track", "   ").is_err());
        assert!(validate_max_len("stream.track", &"x".repeat(61), MAX_TRACK_BYTES).is_err());
        assert!(validate_max_len("stream.track", &"x".repeat(60), MAX_TRACK_BYTES).is_ok());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("key".to_string());
        let missing: Option<String> = None;
        assert_eq!(validate_required_field("consumer_key", &present).unwrap(), "key");
        assert!(matches!(
            validate_required_field("consumer_key", &missing),
            Err(AppError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_no_env_placeholder() {
        assert!(validate_no_env_placeholder("access_token", "abc-123").is_ok());
        assert!(validate_no_env_placeholder("access_token", "pa$$word{").is_ok());
        assert!(validate_no_env_placeholder("access_token", "${TWITTER_ACCESS_TOKEN}").is_err());
        assert!(validate_no_env_placeholder("access_token", "prefix-${X}").is_err());
    }
}
