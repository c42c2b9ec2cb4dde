use crate::domain::model::{ChatId, IncomingMessage, UserState};
use crate::utils::validation::{sanitize_file_name, FileNameError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Collected,
    FileNameSet(String),
    EmptyFileName,
    InvalidFileName(String),
    Ignored,
}

#[derive(Debug)]
pub enum FinishOutcome {
    NotCollecting,
    Ready {
        messages: Vec<IncomingMessage>,
        file_name: Option<String>,
    },
}

/// Per-chat collection state shared between the polling loop and its handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, UserState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn start_collecting(&self, chat_id: ChatId) {
        let mut sessions = self.inner.lock().await;
        let state = sessions.entry(chat_id).or_default();
        state.is_collecting = true;
        state.messages.clear();
    }

    pub async fn begin_file_name(&self, chat_id: ChatId) {
        let mut sessions = self.inner.lock().await;
        sessions.entry(chat_id).or_default().is_setting_file_name = true;
    }

    /// Validates and stores the archive name for the next `/stopcollect`.
    pub async fn set_file_name(&self, chat_id: ChatId, raw: &str) -> MessageOutcome {
        let mut sessions = self.inner.lock().await;
        let state = sessions.entry(chat_id).or_default();
        apply_file_name(state, raw)
    }

    pub async fn record_message(&self, message: IncomingMessage) -> MessageOutcome {
        let mut sessions = self.inner.lock().await;
        let state = sessions.entry(message.chat_id).or_default();

        if state.is_collecting {
            tracing::trace!(
                "Chat {} collected message {}",
                message.chat_id,
                message.message_id
            );
            state.messages.push(message);
            MessageOutcome::Collected
        } else if state.is_setting_file_name {
            tracing::trace!(
                "Chat {} sent file name in message {}",
                message.chat_id,
                message.message_id
            );
            apply_file_name(state, message.text.as_deref().unwrap_or_default())
        } else {
            MessageOutcome::Ignored
        }
    }

    /// Stops collecting and hands over everything gathered, leaving the chat idle.
    pub async fn finish_collecting(&self, chat_id: ChatId) -> FinishOutcome {
        let mut sessions = self.inner.lock().await;
        let state = sessions.entry(chat_id).or_default();

        if !state.is_collecting {
            return FinishOutcome::NotCollecting;
        }

        state.is_collecting = false;
        FinishOutcome::Ready {
            messages: std::mem::take(&mut state.messages),
            file_name: state.file_name.take(),
        }
    }

    pub async fn collected_count(&self, chat_id: ChatId) -> usize {
        let sessions = self.inner.lock().await;
        sessions.get(&chat_id).map_or(0, |s| s.messages.len())
    }
}

fn apply_file_name(state: &mut UserState, raw: &str) -> MessageOutcome {
    match sanitize_file_name(raw) {
        Ok(name) => {
            state.file_name = Some(name.clone());
            state.is_setting_file_name = false;
            MessageOutcome::FileNameSet(name)
        }
        // 名稱無效時繼續等待下一則訊息
        Err(FileNameError::Empty) => MessageOutcome::EmptyFileName,
        Err(reason) => MessageOutcome::InvalidFileName(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(chat: i64, id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            message_id: id,
            chat_id: ChatId(chat),
            text: Some(text.to_string()),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_messages_ignored_when_idle() {
        let store = SessionStore::new();
        assert_eq!(
            store.record_message(text(1, 1, "hi")).await,
            MessageOutcome::Ignored
        );
        assert!(matches!(
            store.finish_collecting(ChatId(1)).await,
            FinishOutcome::NotCollecting
        ));
    }

    #[tokio::test]
    async fn test_collect_then_finish_takes_everything() {
        let store = SessionStore::new();
        store.start_collecting(ChatId(1)).await;
        store.record_message(text(1, 1, "a")).await;
        store.record_message(text(1, 2, "b")).await;
        store.record_message(text(2, 3, "other chat")).await;

        assert_eq!(store.collected_count(ChatId(1)).await, 2);

        match store.finish_collecting(ChatId(1)).await {
            FinishOutcome::Ready { messages, file_name } => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].message_id, 1);
                assert!(file_name.is_none());
            }
            FinishOutcome::NotCollecting => panic!("chat should be collecting"),
        }

        assert_eq!(store.collected_count(ChatId(1)).await, 0);
        assert!(matches!(
            store.finish_collecting(ChatId(1)).await,
            FinishOutcome::NotCollecting
        ));
    }

    #[tokio::test]
    async fn test_restart_clears_previous_messages() {
        let store = SessionStore::new();
        store.start_collecting(ChatId(1)).await;
        store.record_message(text(1, 1, "a")).await;
        store.start_collecting(ChatId(1)).await;

        assert_eq!(store.collected_count(ChatId(1)).await, 0);
    }

    #[tokio::test]
    async fn test_file_name_flow() {
        let store = SessionStore::new();
        store.begin_file_name(ChatId(1)).await;

        assert_eq!(
            store.record_message(text(1, 1, "   ")).await,
            MessageOutcome::EmptyFileName
        );
        assert_eq!(
            store.record_message(text(1, 2, "trip.zip")).await,
            MessageOutcome::FileNameSet("trip".to_string())
        );
        // 設定完成後回到閒置
        assert_eq!(
            store.record_message(text(1, 3, "later")).await,
            MessageOutcome::Ignored
        );

        store.start_collecting(ChatId(1)).await;
        match store.finish_collecting(ChatId(1)).await {
            FinishOutcome::Ready { file_name, .. } => {
                assert_eq!(file_name.as_deref(), Some("trip"))
            }
            FinishOutcome::NotCollecting => panic!("chat should be collecting"),
        }

        // 檔名只用一次
        store.start_collecting(ChatId(1)).await;
        match store.finish_collecting(ChatId(1)).await {
            FinishOutcome::Ready { file_name, .. } => assert!(file_name.is_none()),
            FinishOutcome::NotCollecting => panic!("chat should be collecting"),
        }
    }

    #[tokio::test]
    async fn test_invalid_file_name_carries_reason() {
        let store = SessionStore::new();
        store.begin_file_name(ChatId(1)).await;

        assert_eq!(
            store.record_message(text(1, 1, ".")).await,
            MessageOutcome::InvalidFileName(". 是保留名称".to_string())
        );
        // 仍在等待檔名
        assert_eq!(
            store.record_message(text(1, 2, "ok")).await,
            MessageOutcome::FileNameSet("ok".to_string())
        );
    }

    #[tokio::test]
    async fn test_collecting_wins_over_file_name_prompt() {
        let store = SessionStore::new();
        store.start_collecting(ChatId(1)).await;
        store.begin_file_name(ChatId(1)).await;

        assert_eq!(
            store.record_message(text(1, 1, "name?")).await,
            MessageOutcome::Collected
        );

        store.finish_collecting(ChatId(1)).await;
        assert_eq!(
            store.record_message(text(1, 2, "album")).await,
            MessageOutcome::FileNameSet("album".to_string())
        );
    }
}
