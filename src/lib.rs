pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

/// Package version plus `git describe`, stamped by the build script.
pub const VERSION: &str = env!("BOT_VERSION");

pub use adapters::{storage::LocalStorage, telegram::TelegramClient};
pub use config::{BotConfig, CliArgs};
pub use crate::core::{
    dispatcher::Dispatcher, engine::ArchiveEngine, handler::UpdateHandler,
    pipeline::ImagePipeline, session::SessionStore,
};
pub use utils::error::{BotError, Result};
