use crate::core::{BotApi, Pipeline};
use crate::domain::model::{ArchiveReport, ArchiveRequest};
use crate::utils::error::{BotError, Result};
use std::sync::Arc;

/// Largest document a bot may upload through the public Bot API.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub struct ArchiveEngine<B: BotApi, P: Pipeline> {
    bot: Arc<B>,
    pipeline: P,
}

impl<B: BotApi, P: Pipeline> ArchiveEngine<B, P> {
    pub fn new(bot: Arc<B>, pipeline: P) -> Self {
        Self { bot, pipeline }
    }

    /// Builds and sends the archive, then removes the job directory whatever happened.
    /// Returns `None` when the collection held no images.
    pub async fn run(&self, request: &ArchiveRequest) -> Result<Option<ArchiveReport>> {
        let result = self.build_and_send(request).await;

        match self.pipeline.cleanup(request).await {
            Ok(()) => tracing::info!("Cleaned up temporary files for chat {}", request.chat_id),
            Err(e) => tracing::warn!(
                "Failed to clean up {} for chat {}: {}",
                request.job_dir(),
                request.chat_id,
                e
            ),
        }

        result
    }

    async fn build_and_send(&self, request: &ArchiveRequest) -> Result<Option<ArchiveReport>> {
        let chat_id = request.chat_id;
        self.bot.send_message(chat_id, "⏳ 正在处理，请稍候...").await?;

        // Extract
        let images = self.pipeline.extract(request).await?;
        if images.is_empty() {
            self.bot
                .send_message(chat_id, "🤷‍♀️ 在你发送的消息中没有找到任何图片。")
                .await?;
            return Ok(None);
        }
        let total = images.len();

        // Transform
        let downloads = self.pipeline.transform(request, images).await?;
        let failed = downloads.failed;
        tracing::info!(
            "Downloaded {} of {} images to {}",
            downloads.stored.len(),
            total,
            request.job_dir()
        );

        // Load
        let output = self.pipeline.load(request, downloads).await?;
        tracing::info!(
            "Created zip file {} ({} bytes)",
            output.file_name,
            output.bytes.len()
        );

        if output.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(BotError::ProcessingError {
                message: format!(
                    "压缩包大小 {} MB 超过 Telegram 的 50 MB 上限，请分批收集",
                    output.bytes.len() / (1024 * 1024)
                ),
            });
        }

        let mut text = format!(
            "✅ 处理完成！共下载 {} 张图片，正在发送压缩包...",
            output.image_count
        );
        if failed > 0 {
            text.push_str(&format!("\n⚠️ 另有 {} 张图片下载失败", failed));
        }
        self.bot.send_message(chat_id, &text).await?;

        let report = ArchiveReport {
            file_name: output.file_name.clone(),
            image_count: output.image_count,
            failed_downloads: failed,
        };
        self.bot
            .send_document(chat_id, &output.file_name, output.bytes)
            .await?;
        tracing::info!("Sent zip file to chat {}", chat_id);

        Ok(Some(report))
    }

    /// Runs a job in the background; failures are logged and reported to the chat.
    pub async fn process(&self, request: ArchiveRequest) {
        if let Err(e) = self.run(&request).await {
            tracing::error!(
                "Archive job for chat {} failed: {} (Category: {:?}, Severity: {:?})",
                request.chat_id,
                e,
                e.category(),
                e.severity()
            );

            let text = format!("❌ 处理失败: {}", e.user_friendly_message());
            if let Err(send_err) = self.bot.send_message(request.chat_id, &text).await {
                tracing::warn!(
                    "Could not report failure to chat {}: {}",
                    request.chat_id,
                    send_err
                );
            }
        }
    }
}
