pub mod toml_config;

use crate::adapters::telegram::DEFAULT_API_URL;
use crate::utils::error::{BotError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_non_empty_secret, validate_path, validate_range, validate_url, Validate,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use toml_config::FileConfig;

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WORK_DIR: &str = ".";
pub const DEFAULT_CONCURRENT_DOWNLOADS: usize = 5;

/// Command line flags. Unset flags fall back to the config file, then defaults.
#[derive(Clone, Parser)]
#[command(name = "telegram-images-bot")]
#[command(version = crate::VERSION)]
#[command(about = "Telegram bot that collects images from a chat and sends them back as a zip")]
pub struct CliArgs {
    /// Bot API token issued by @BotFather
    #[arg(long, env = "TG_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Bot API base URL (a local Bot API server also works)
    #[arg(long, env = "TG_API_URL")]
    pub api_url: Option<String>,

    /// Long polling timeout in seconds
    #[arg(long, env = "TG_POLL_TIMEOUT")]
    pub poll_timeout: Option<u64>,

    /// Directory for temporary downloads and archives
    #[arg(long, env = "TG_WORK_DIR")]
    pub work_dir: Option<String>,

    /// Maximum parallel image downloads per archive
    #[arg(long, env = "TG_CONCURRENT_DOWNLOADS")]
    pub concurrent_downloads: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "TG_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, env = "TG_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    pub poll_timeout: u64,
    pub work_dir: String,
    pub concurrent_downloads: usize,
    pub verbose: bool,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("work_dir", &self.work_dir)
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("verbose", &self.verbose)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl BotConfig {
    /// Reads the config file named by `--config`, if any, and merges it under the flags.
    pub fn load(args: CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Some(FileConfig::from_file(path)?),
            None => None,
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: CliArgs, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let token = args
            .token
            .or(file.telegram.token)
            .ok_or_else(|| BotError::MissingConfigError {
                field: "TG_BOT_TOKEN".to_string(),
            })?;

        Ok(Self {
            token,
            api_url: args
                .api_url
                .or(file.telegram.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            poll_timeout: args
                .poll_timeout
                .or(file.telegram.poll_timeout_seconds)
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            work_dir: args
                .work_dir
                .or(file.storage.work_dir)
                .unwrap_or_else(|| DEFAULT_WORK_DIR.to_string()),
            concurrent_downloads: args
                .concurrent_downloads
                .or(file.download.concurrent_downloads)
                .unwrap_or(DEFAULT_CONCURRENT_DOWNLOADS),
            verbose: args.verbose || file.logging.verbose.unwrap_or(false),
            log_format: args
                .log_format
                .or(file.logging.format)
                .unwrap_or_default(),
        })
    }

    pub fn poll_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.poll_timeout)
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_secret("TG_BOT_TOKEN", &self.token)?;
        validate_url("api_url", &self.api_url)?;
        validate_path("work_dir", &self.work_dir)?;
        validate_range("concurrent_downloads", self.concurrent_downloads, 1, 32)?;
        validate_range("poll_timeout", self.poll_timeout, 1, 600)?;
        Ok(())
    }
}
