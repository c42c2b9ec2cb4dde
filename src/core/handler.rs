use crate::core::commands::{help_text, Command};
use crate::core::session::{FinishOutcome, MessageOutcome, SessionStore};
use crate::core::BotApi;
use crate::domain::model::{ArchiveRequest, ChatId, IncomingMessage};
use crate::utils::error::Result;
use std::sync::Arc;

/// Routes one incoming message. A `/stopcollect` with collected messages yields the
/// archive job to run in the background; everything else is answered inline.
pub struct UpdateHandler<B: BotApi> {
    bot: Arc<B>,
    sessions: SessionStore,
    bot_username: Option<String>,
}

impl<B: BotApi> UpdateHandler<B> {
    pub fn new(bot: Arc<B>, sessions: SessionStore, bot_username: Option<String>) -> Self {
        Self {
            bot,
            sessions,
            bot_username,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle(&self, message: IncomingMessage) -> Result<Option<ArchiveRequest>> {
        let command = message
            .text
            .as_deref()
            .and_then(|text| Command::parse(text, self.bot_username.as_deref()));

        match command {
            Some(command) => self.handle_command(message.chat_id, command).await,
            None => {
                let chat_id = message.chat_id;
                let outcome = self.sessions.record_message(message).await;
                self.reply_to_outcome(chat_id, outcome).await?;
                Ok(None)
            }
        }
    }

    async fn handle_command(
        &self,
        chat_id: ChatId,
        command: Command,
    ) -> Result<Option<ArchiveRequest>> {
        tracing::debug!("Chat {} sent {:?}", chat_id, command);

        match command {
            Command::Start | Command::Help => {
                self.bot.send_message(chat_id, help_text()).await?;
            }
            Command::StartCollect => {
                self.sessions.start_collecting(chat_id).await;
                tracing::info!("Chat {} started a collection", chat_id);
                self.bot
                    .send_message(
                        chat_id,
                        "✅收集已开始，请发送图片或包含图片的消息。完成后，发送/stopcollect以结束收集",
                    )
                    .await?;
            }
            Command::StopCollect => return self.stop_collecting(chat_id).await,
            Command::Version => {
                self.bot
                    .send_message(chat_id, &format!("当前版本：{}", crate::VERSION))
                    .await?;
            }
            Command::FileName(Some(name)) => {
                let outcome = self.sessions.set_file_name(chat_id, &name).await;
                self.reply_to_outcome(chat_id, outcome).await?;
            }
            Command::FileName(None) => {
                self.sessions.begin_file_name(chat_id).await;
                self.bot
                    .send_message(chat_id, "请将文件名发送给我，我会将其设置为压缩包名")
                    .await?;
            }
        }

        Ok(None)
    }

    async fn stop_collecting(&self, chat_id: ChatId) -> Result<Option<ArchiveRequest>> {
        match self.sessions.finish_collecting(chat_id).await {
            FinishOutcome::NotCollecting => {
                self.bot
                    .send_message(chat_id, "🤔 你还没有开始收集，请先发送 /startcollect。")
                    .await?;
                Ok(None)
            }
            FinishOutcome::Ready { messages, .. } if messages.is_empty() => {
                self.bot
                    .send_message(chat_id, "ℹ️ 你没有发送任何消息，无需处理。")
                    .await?;
                Ok(None)
            }
            FinishOutcome::Ready {
                messages,
                file_name,
            } => {
                tracing::info!(
                    "Stopped collecting for chat {}. Processing {} messages.",
                    chat_id,
                    messages.len()
                );
                Ok(Some(ArchiveRequest::new(chat_id, messages, file_name)))
            }
        }
    }

    async fn reply_to_outcome(&self, chat_id: ChatId, outcome: MessageOutcome) -> Result<()> {
        let text = match outcome {
            MessageOutcome::FileNameSet(name) => format!("✅已设置文件名为 {}.zip", name),
            MessageOutcome::EmptyFileName => "❌ 文件名不能为空".to_string(),
            MessageOutcome::InvalidFileName(reason) => {
                format!("❌ 文件名不可用：{}，请换一个", reason)
            }
            MessageOutcome::Collected | MessageOutcome::Ignored => return Ok(()),
        };
        self.bot.send_message(chat_id, &text).await
    }
}
