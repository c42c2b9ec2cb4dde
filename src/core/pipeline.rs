use crate::core::{BotApi, Pipeline, Storage};
use crate::domain::model::{
    ArchiveOutput, ArchiveRequest, DownloadResult, ImageKind, RemoteImage, StoredImage,
};
use crate::utils::error::{BotError, Result};
use futures::stream::{self, StreamExt};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

const DEFAULT_EXTENSION: &str = "jpg";

/// Resolves, downloads and zips the images of one collection.
pub struct ImagePipeline<B: BotApi, S: Storage> {
    bot: Arc<B>,
    storage: S,
    concurrent_downloads: usize,
}

impl<B: BotApi, S: Storage> ImagePipeline<B, S> {
    pub fn new(bot: Arc<B>, storage: S, concurrent_downloads: usize) -> Self {
        Self {
            bot,
            storage,
            concurrent_downloads: concurrent_downloads.max(1),
        }
    }

    async fn download_one(&self, job_dir: &str, image: RemoteImage) -> Result<StoredImage> {
        let entry_name = format!("image_{}.{}", image.index, image.extension);
        let storage_path = format!("{}/images/{}", job_dir, entry_name);

        let data = self
            .bot
            .download_file(&image.file_path)
            .await
            .map_err(|e| BotError::Download {
                index: image.index,
                message: e.to_string(),
            })?;
        self.storage.write_file(&storage_path, &data).await?;

        tracing::trace!("Stored image {} ({} bytes)", image.index, data.len());
        Ok(StoredImage {
            index: image.index,
            entry_name,
            storage_path,
        })
    }
}

/// Extension of the downloaded file: taken from the Telegram file path, then the
/// document's file name, then `jpg`.
pub fn image_extension(file_path: &str, kind: &ImageKind) -> String {
    let from_name = |name: &str| {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| (1..=5).contains(&ext.len()))
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
    };

    let document_name = match kind {
        ImageKind::Document {
            file_name: Some(name),
            ..
        } => Some(name.as_str()),
        _ => None,
    };

    from_name(file_path)
        .or_else(|| document_name.and_then(from_name))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Deflate-compressed zip of `(entry name, bytes)` pairs, in the given order.
pub fn build_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);

    for (name, data) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[async_trait::async_trait]
impl<B: BotApi, S: Storage> Pipeline for ImagePipeline<B, S> {
    async fn extract(&self, request: &ArchiveRequest) -> Result<Vec<RemoteImage>> {
        let mut images = Vec::new();

        let refs = request.messages.iter().filter_map(|m| m.image.as_ref());
        for (i, image) in refs.enumerate() {
            let index = i + 1;
            let file = self.bot.get_file(&image.file_id).await?;
            let file_path = file.file_path.ok_or_else(|| BotError::ProcessingError {
                message: format!("第 {} 张图片暂时无法从 Telegram 获取", index),
            })?;

            tracing::debug!(
                "Resolved image {} ({}x{}) for chat {}",
                index,
                image.width,
                image.height,
                request.chat_id
            );
            images.push(RemoteImage {
                index,
                extension: image_extension(&file_path, &image.kind),
                file_path,
            });
        }

        Ok(images)
    }

    async fn transform(
        &self,
        request: &ArchiveRequest,
        images: Vec<RemoteImage>,
    ) -> Result<DownloadResult> {
        let job_dir = request.job_dir();
        let total = images.len();

        let results: Vec<Result<StoredImage>> = stream::iter(images)
            .map(|image| self.download_one(&job_dir, image))
            .buffer_unordered(self.concurrent_downloads)
            .collect()
            .await;

        let mut downloads = DownloadResult::default();
        for result in results {
            match result {
                Ok(stored) => downloads.stored.push(stored),
                Err(e) => {
                    tracing::warn!("Chat {}: {}", request.chat_id, e);
                    downloads.failed += 1;
                }
            }
        }
        downloads.stored.sort_by_key(|image| image.index);

        if downloads.stored.is_empty() && total > 0 {
            return Err(BotError::ProcessingError {
                message: format!("{} 张图片全部下载失败", total),
            });
        }

        Ok(downloads)
    }

    async fn load(
        &self,
        request: &ArchiveRequest,
        downloads: DownloadResult,
    ) -> Result<ArchiveOutput> {
        let mut entries = Vec::with_capacity(downloads.stored.len());
        for image in &downloads.stored {
            let data = self.storage.read_file(&image.storage_path).await?;
            entries.push((image.entry_name.clone(), data));
        }

        tracing::debug!("Creating ZIP file with {} images", entries.len());
        let bytes = build_zip(&entries)?;

        let file_name = request.archive_name();
        let storage_path = format!("{}/{}", request.job_dir(), file_name);
        tracing::debug!("Writing ZIP file ({} bytes) to storage", bytes.len());
        self.storage.write_file(&storage_path, &bytes).await?;

        Ok(ArchiveOutput {
            file_name,
            storage_path,
            bytes,
            image_count: entries.len(),
        })
    }

    async fn cleanup(&self, request: &ArchiveRequest) -> Result<()> {
        self.storage.remove(&request.job_dir()).await
    }
}
