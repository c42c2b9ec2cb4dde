//! In-memory `BotApi` used by the core unit tests.

use crate::core::BotApi;
use crate::domain::model::{BotCommand, BotIdentity, ChatId, RemoteFile, Update};
use crate::utils::error::{BotError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Default)]
pub struct RecordingBot {
    files: HashMap<String, (String, Vec<u8>)>,
    updates: Mutex<VecDeque<Result<Vec<Update>>>>,
    offsets: Mutex<Vec<i64>>,
    messages: Mutex<Vec<(ChatId, String)>>,
    documents: Mutex<Vec<(ChatId, String, Vec<u8>)>>,
    drained: Notify,
}

impl RecordingBot {
    pub fn with_file(mut self, file_id: &str, file_path: &str, data: &[u8]) -> Self {
        self.files
            .insert(file_id.to_string(), (file_path.to_string(), data.to_vec()));
        self
    }

    pub fn push_updates(&self, batch: Result<Vec<Update>>) {
        self.updates.lock().unwrap().push_back(batch);
    }

    /// Resolves once every queued batch has been handed out.
    pub async fn drained(&self) {
        self.drained.notified().await;
    }

    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<(ChatId, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn sent_documents(&self) -> Vec<(ChatId, String, Vec<u8>)> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BotApi for RecordingBot {
    async fn get_me(&self) -> Result<BotIdentity> {
        Ok(BotIdentity {
            id: 1,
            username: Some("imagesbot".to_string()),
        })
    }

    async fn set_my_commands(&self, _commands: &[BotCommand]) -> Result<()> {
        Ok(())
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.updates.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None if timeout_secs == 0 => Ok(Vec::new()),
            None => {
                self.drained.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile> {
        Ok(RemoteFile {
            file_id: file_id.to_string(),
            file_path: self.files.get(file_id).map(|(path, _)| path.clone()),
            file_size: None,
        })
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        self.files
            .values()
            .find(|(path, _)| path == file_path)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| BotError::Telegram {
                code: 404,
                description: "Not Found".to_string(),
                retry_after: None,
            })
    }

    async fn send_document(&self, chat_id: ChatId, file_name: &str, data: Vec<u8>) -> Result<()> {
        self.documents
            .lock()
            .unwrap()
            .push((chat_id, file_name.to_string(), data));
        Ok(())
    }
}
