use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageKind {
    Photo,
    Document {
        file_name: Option<String>,
        mime_type: Option<String>,
    },
}

/// One downloadable image attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat_id: ChatId,
    pub text: Option<String>,
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub file_id: String,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct UserState {
    /// 是否在收集模式
    pub is_collecting: bool,
    /// 是否在等待檔名
    pub is_setting_file_name: bool,
    pub messages: Vec<IncomingMessage>,
    pub file_name: Option<String>,
}

/// Everything a background archive job needs, detached from session state.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub chat_id: ChatId,
    pub job_id: Uuid,
    pub messages: Vec<IncomingMessage>,
    pub file_name: Option<String>,
    pub requested_at: DateTime<Local>,
}

impl ArchiveRequest {
    pub fn new(chat_id: ChatId, messages: Vec<IncomingMessage>, file_name: Option<String>) -> Self {
        Self {
            chat_id,
            job_id: Uuid::new_v4(),
            messages,
            file_name,
            requested_at: Local::now(),
        }
    }

    /// Scratch directory relative to the work directory.
    pub fn job_dir(&self) -> String {
        format!("temp_{}_{}", self.chat_id.0, self.job_id)
    }

    pub fn archive_name(&self) -> String {
        archive_name(self.file_name.as_deref(), self.chat_id, self.requested_at)
    }
}

pub fn archive_name(custom: Option<&str>, chat_id: ChatId, at: DateTime<Local>) -> String {
    match custom {
        Some(name) => format!("{}.zip", name),
        None => format!("images_{}_{}.zip", at.format("%Y-%m-%d:%H:%M"), chat_id.0),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub index: usize,
    pub file_path: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub index: usize,
    pub entry_name: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadResult {
    pub stored: Vec<StoredImage>,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct ArchiveOutput {
    pub file_name: String,
    pub storage_path: String,
    pub bytes: Vec<u8>,
    pub image_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub file_name: String,
    pub image_count: usize,
    pub failed_downloads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_archive_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).unwrap();
        assert_eq!(
            archive_name(None, ChatId(-100123), at),
            "images_2024-03-09:14:05_-100123.zip"
        );
    }

    #[test]
    fn test_custom_archive_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(archive_name(Some("trip"), ChatId(7), at), "trip.zip");
    }

    #[test]
    fn test_job_dir_is_unique_per_request() {
        let a = ArchiveRequest::new(ChatId(42), vec![], None);
        let b = ArchiveRequest::new(ChatId(42), vec![], None);
        assert!(a.job_dir().starts_with("temp_42_"));
        assert_ne!(a.job_dir(), b.job_dir());
    }
}
