use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use telegram_images_bot::core::commands::Command;
use telegram_images_bot::domain::ports::BotApi;
use telegram_images_bot::utils::{logger, validation::Validate};
use telegram_images_bot::{
    ArchiveEngine, BotConfig, CliArgs, Dispatcher, ImagePipeline, LocalStorage, SessionStore,
    TelegramClient, UpdateHandler, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在時忽略
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    let config = match BotConfig::load(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建议: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_format);

    tracing::info!("Starting telegram-images-bot {}", VERSION);
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建议: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let bot = Arc::new(
        TelegramClient::new(
            &config.api_url,
            &config.token,
            config.poll_timeout_duration(),
        )
        .context("failed to build the HTTP client")?,
    );

    tracing::info!("Connecting to Telegram");
    let identity = bot
        .get_me()
        .await
        .context("could not reach Telegram, check TG_BOT_TOKEN and TG_API_URL")?;
    tracing::info!(
        "Connected as @{}",
        identity.username.as_deref().unwrap_or("<no username>")
    );

    match bot.set_my_commands(&Command::bot_commands()).await {
        Ok(()) => tracing::info!("Registered bot commands"),
        Err(e) => tracing::error!("Failed to register bot commands: {}", e),
    }

    let storage = LocalStorage::new(&config.work_dir);
    let pipeline = ImagePipeline::new(Arc::clone(&bot), storage, config.concurrent_downloads);
    let engine = Arc::new(ArchiveEngine::new(Arc::clone(&bot), pipeline));
    let handler = UpdateHandler::new(Arc::clone(&bot), SessionStore::new(), identity.username);
    let dispatcher = Dispatcher::new(bot, handler, engine, config.poll_timeout);

    let summary = dispatcher.run(shutdown_signal()).await;
    tracing::info!(
        "Stopped after {} updates and {} archives",
        summary.updates_handled,
        summary.archives_started
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    // docker stop 送的是 SIGTERM
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl-c"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
