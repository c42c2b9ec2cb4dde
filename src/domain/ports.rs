use crate::domain::model::{
    ArchiveOutput, ArchiveRequest, BotCommand, BotIdentity, ChatId, DownloadResult, RemoteFile,
    RemoteImage, Update,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Removes a file or a whole directory tree. Missing paths are not an error.
    fn remove(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The subset of the Telegram Bot API the bot relies on.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_me(&self) -> Result<BotIdentity>;
    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()>;
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;
    async fn get_file(&self, file_id: &str) -> Result<RemoteFile>;
    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>>;
    async fn send_document(&self, chat_id: ChatId, file_name: &str, data: Vec<u8>) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, request: &ArchiveRequest) -> Result<Vec<RemoteImage>>;
    async fn transform(
        &self,
        request: &ArchiveRequest,
        images: Vec<RemoteImage>,
    ) -> Result<DownloadResult>;
    async fn load(&self, request: &ArchiveRequest, downloads: DownloadResult)
        -> Result<ArchiveOutput>;
    /// Drops every file the job created.
    async fn cleanup(&self, request: &ArchiveRequest) -> Result<()>;
}
