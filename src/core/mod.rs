pub mod commands;
pub mod dispatcher;
pub mod engine;
pub mod handler;
pub mod pipeline;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{ArchiveReport, ArchiveRequest, IncomingMessage};
pub use crate::domain::ports::{BotApi, Pipeline, Storage};
pub use crate::utils::error::Result;
