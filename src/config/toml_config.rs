use crate::utils::error::{AppError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Optional file-based configuration. Every field may be omitted.
///
/// ```toml
/// debug_user = "my_test_account"
///
/// [credentials]
/// consumer_key = "${TWITTER_CONSUMER_KEY}"
///
/// [stream]
/// track = "Thanks Obama"
///
/// [store]
/// redis_url = "redis://127.0.0.1:6379/"
/// key = "repliedTo"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub debug_user: Option<String>,
    pub credentials: Option<CredentialsConfig>,
    pub stream: Option<StreamSection>,
    pub store: Option<StoreConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_secret: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSection {
    pub track: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub redis_url: Option<String>,
    pub key: Option<String>,
    pub memory: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
    pub monitor: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 固定的 pattern，不會編譯失敗
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TWITTER_CONSUMER_KEY})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
debug_user = "tester"

[credentials]
consumer_key = "ck"
consumer_secret = "cs"
access_token = "at"
access_secret = "as"

[stream]
track = "Thanks Obama"
endpoint = "https://stream.example.com/filter.json"

[store]
redis_url = "redis://cache:6379/"
key = "seenAuthors"

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.debug_user.as_deref(), Some("tester"));
        let store = config.store.unwrap();
        assert_eq!(store.key.as_deref(), Some("seenAuthors"));
        assert_eq!(store.memory, None);
        assert_eq!(config.logging.unwrap().json, Some(true));
        assert_eq!(
            config.stream.unwrap().endpoint.as_deref(),
            Some("https://stream.example.com/filter.json")
        );
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.credentials.is_none());
        assert!(config.stream.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("THANKS_LISTENER_TEST_SECRET", "s3cret");

        let toml_content = r#"
[credentials]
consumer_secret = "${THANKS_LISTENER_TEST_SECRET}"
access_secret = "${THANKS_LISTENER_TEST_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let creds = config.credentials.unwrap();
        assert_eq!(creds.consumer_secret.as_deref(), Some("s3cret"));
        assert_eq!(
            creds.access_secret.as_deref(),
            Some("${THANKS_LISTENER_TEST_UNSET_VAR}")
        );

        std::env::remove_var("THANKS_LISTENER_TEST_SECRET");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[stream\ntrack = ");
        assert!(matches!(
            result,
            Err(AppError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[stream]\ntrack = \"from file\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.stream.unwrap().track.as_deref(), Some("from file"));
    }
}
