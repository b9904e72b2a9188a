pub mod toml_config;

use crate::adapters::redis_store::DEFAULT_REDIS_KEY;
use crate::adapters::twitter::stream::{DEFAULT_STREAM_ENDPOINT, DEFAULT_TRACK};
use crate::core::ConfigProvider;
use crate::domain::model::Credentials;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate, MAX_TRACK_BYTES};
use clap::Parser;
use toml_config::TomlConfig;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "thanks-listener")]
#[command(about = "Listens to a keyword-filtered post stream and remembers which authors it has seen")]
pub struct CliConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, env = "TWITTER_CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: Option<String>,

    #[arg(long, env = "TWITTER_CONSUMER_SECRET", hide_env_values = true)]
    pub consumer_secret: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_SECRET", hide_env_values = true)]
    pub access_secret: Option<String>,

    /// Screen name that always takes the first-time branch
    #[arg(long, env = "TWITTER_DEBUG_USER")]
    pub debug_user: Option<String>,

    /// Phrase to track on the filtered stream
    #[arg(long, env = "TRACK")]
    pub track: Option<String>,

    #[arg(long)]
    pub stream_endpoint: Option<String>,

    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Redis set holding the authors already seen
    #[arg(long)]
    pub redis_key: Option<String>,

    /// Keep the seen-set in memory instead of Redis (nothing is persisted)
    #[arg(long)]
    pub memory_store: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

/// Fully resolved configuration: CLI / env first, then the TOML file, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub debug_user: Option<String>,
    pub track: String,
    pub stream_endpoint: String,
    pub redis_url: String,
    pub redis_key: String,
    pub memory_store: bool,
    pub verbose: bool,
    pub json_logs: bool,
    pub monitor: bool,
}

impl Settings {
    pub fn resolve(cli: CliConfig, file: Option<TomlConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let creds = file.credentials.unwrap_or_default();
        let stream = file.stream.unwrap_or_default();
        let store = file.store.unwrap_or_default();
        let logging = file.logging.unwrap_or_default();

        let consumer_key = cli.consumer_key.or(creds.consumer_key);
        let consumer_secret = cli.consumer_secret.or(creds.consumer_secret);
        let access_token = cli.access_token.or(creds.access_token);
        let access_secret = cli.access_secret.or(creds.access_secret);

        let credentials = Credentials {
            consumer_key: validation::validate_required_field("consumer_key", &consumer_key)?
                .clone(),
            consumer_secret: validation::validate_required_field(
                "consumer_secret",
                &consumer_secret,
            )?
            .clone(),
            access_token: validation::validate_required_field("access_token", &access_token)?
                .clone(),
            access_secret: validation::validate_required_field("access_secret", &access_secret)?
                .clone(),
        };

        Ok(Self {
            credentials,
            debug_user: cli
                .debug_user
                .or(file.debug_user)
                .filter(|name| !name.trim().is_empty()),
            track: cli
                .track
                .or(stream.track)
                .unwrap_or_else(|| DEFAULT_TRACK.to_string()),
            stream_endpoint: cli
                .stream_endpoint
                .or(stream.endpoint)
                .unwrap_or_else(|| DEFAULT_STREAM_ENDPOINT.to_string()),
            redis_url: cli
                .redis_url
                .or(store.redis_url)
                .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            redis_key: cli
                .redis_key
                .or(store.key)
                .unwrap_or_else(|| DEFAULT_REDIS_KEY.to_string()),
            memory_store: cli.memory_store || store.memory.unwrap_or(false),
            verbose: cli.verbose || logging.verbose.unwrap_or(false),
            json_logs: cli.json_logs || logging.json.unwrap_or(false),
            monitor: cli.monitor || logging.monitor.unwrap_or(false),
        })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        let credentials = [
            ("consumer_key", &self.credentials.consumer_key),
            ("consumer_secret", &self.credentials.consumer_secret),
            ("access_token", &self.credentials.access_token),
            ("access_secret", &self.credentials.access_secret),
        ];
        for (field, value) in credentials {
            validation::validate_non_empty_string(field, value)?;
            validation::validate_no_env_placeholder(field, value)?;
        }

        validation::validate_non_empty_string("stream.track", &self.track)?;
        validation::validate_max_len("stream.track", &self.track, MAX_TRACK_BYTES)?;
        validation::validate_url("stream.endpoint", &self.stream_endpoint)?;

        if !self.memory_store {
            validation::validate_redis_url("store.redis_url", &self.redis_url)?;
        }
        validation::validate_non_empty_string("store.key", &self.redis_key)?;

        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn track(&self) -> &str {
        &self.track
    }

    fn stream_endpoint(&self) -> &str {
        &self.stream_endpoint
    }

    fn redis_url(&self) -> &str {
        &self.redis_url
    }

    fn redis_key(&self) -> &str {
        &self.redis_key
    }

    fn debug_user(&self) -> Option<&str> {
        self.debug_user.as_deref()
    }
}
