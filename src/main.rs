use clap::Parser;
use thanks_listener::adapters::twitter::StreamConfig;
use thanks_listener::config::toml_config::TomlConfig;
use thanks_listener::core::{ConfigProvider, PostStream, SeenStore};
use thanks_listener::utils::{logger, validation::Validate};
use thanks_listener::{
    AppError, CliConfig, Listener, MemorySeenStore, RedisSeenStore, SeenTracker, Settings,
    TwitterStream,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 先讀設定檔，才知道 logging 設定
    let file = cli.config.as_deref().map(TomlConfig::from_file).transpose();

    let logging = file
        .as_ref()
        .ok()
        .and_then(|f| f.as_ref())
        .and_then(|f| f.logging.clone())
        .unwrap_or_default();
    logger::init_cli_logger(
        cli.verbose || logging.verbose.unwrap_or(false),
        cli.json_logs || logging.json.unwrap_or(false),
    );

    tracing::info!("Starting thanks-listener");
    if let Some(path) = cli.config.as_deref() {
        tracing::info!("📁 Loading configuration from: {}", path);
    }

    let file = match file {
        Ok(file) => file,
        Err(e) => exit_with_config_error(&e),
    };

    let settings = match Settings::resolve(cli, file) {
        Ok(settings) => settings,
        Err(e) => exit_with_config_error(&e),
    };

    // 驗證配置
    if let Err(e) = settings.validate() {
        exit_with_config_error(&e);
    }
    tracing::debug!("Settings: {:?}", settings);

    let stream_config = StreamConfig::new(settings.stream_endpoint(), settings.track());
    let stream = TwitterStream::new(settings.credentials().clone(), stream_config)?;

    tracing::info!("🔍 Tracking \"{}\"", settings.track());
    if let Some(debug_user) = settings.debug_user() {
        tracing::info!("Debug user: @{}", debug_user);
    }

    if settings.memory_store {
        tracing::warn!("Using in-memory seen-set; nothing will be persisted");
        run(stream, MemorySeenStore::new(), &settings).await;
    } else {
        tracing::info!(
            "Recording authors in Redis set '{}' at {}",
            settings.redis_key(),
            settings.redis_url()
        );
        let store = match RedisSeenStore::open(settings.redis_url(), settings.redis_key()) {
            Ok(store) => store,
            Err(e) => exit_with_config_error(&e),
        };
        run(stream, store, &settings).await;
    }

    Ok(())
}

async fn run<P: PostStream, S: SeenStore>(stream: P, store: S, settings: &Settings) {
    let tracker = SeenTracker::new(store, settings.debug_user().map(str::to_string));
    let mut listener = Listener::new_with_monitoring(stream, tracker, settings.monitor);
    listener.run().await;
}

fn exit_with_config_error(e: &AppError) -> ! {
    tracing::error!("❌ Configuration validation failed: {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(1);
}
