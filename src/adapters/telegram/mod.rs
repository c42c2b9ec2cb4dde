pub mod client;
pub mod types;

pub use client::{TelegramClient, DEFAULT_API_URL};
