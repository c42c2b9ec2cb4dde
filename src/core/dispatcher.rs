use crate::core::engine::ArchiveEngine;
use crate::core::handler::UpdateHandler;
use crate::core::{BotApi, Pipeline};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub updates_handled: u64,
    pub archives_started: u64,
}

/// Long-polling loop: reads updates in order, answers them, and runs archive jobs
/// on their own tasks.
pub struct Dispatcher<B: BotApi + 'static, P: Pipeline + 'static> {
    bot: Arc<B>,
    handler: UpdateHandler<B>,
    engine: Arc<ArchiveEngine<B, P>>,
    poll_timeout: u64,
}

impl<B: BotApi + 'static, P: Pipeline + 'static> Dispatcher<B, P> {
    pub fn new(
        bot: Arc<B>,
        handler: UpdateHandler<B>,
        engine: Arc<ArchiveEngine<B, P>>,
        poll_timeout: u64,
    ) -> Self {
        Self {
            bot,
            handler,
            engine,
            poll_timeout,
        }
    }

    /// Polls until `shutdown` resolves, then waits for running archive jobs.
    pub async fn run<F: Future<Output = ()>>(&self, shutdown: F) -> DispatchSummary {
        tokio::pin!(shutdown);

        let mut summary = DispatchSummary::default();
        let mut jobs = JoinSet::new();
        let mut offset = 0_i64;
        let mut backoff = INITIAL_BACKOFF;

        tracing::info!("Polling for updates");
        loop {
            while let Some(finished) = jobs.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!("Archive task aborted: {}", e);
                }
            }

            let polled = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping polling");
                    break;
                }
                polled = self.bot.get_updates(offset, self.poll_timeout) => polled,
            };

            let updates = match polled {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    updates
                }
                Err(e) => {
                    let delay = match e.retry_after() {
                        Some(secs) => Duration::from_secs(secs),
                        None => {
                            let delay = backoff;
                            backoff = (backoff * 2).min(MAX_BACKOFF);
                            delay
                        }
                    };
                    tracing::warn!("Polling failed: {}. Retrying in {:?}", e, delay);

                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown requested, stopping polling");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                summary.updates_handled += 1;

                let Some(message) = update.message else {
                    continue;
                };
                let chat_id = message.chat_id;

                match self.handler.handle(message).await {
                    Ok(Some(request)) => {
                        summary.archives_started += 1;
                        let engine = Arc::clone(&self.engine);
                        jobs.spawn(async move { engine.process(request).await });
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Failed to handle message in chat {}: {}", chat_id, e),
                }
            }
        }

        // 通知 Telegram 已處理到 offset，避免重啟後重複收到
        if offset > 0 {
            if let Err(e) = self.bot.get_updates(offset, 0).await {
                tracing::debug!("Could not confirm final offset {}: {}", offset, e);
            }
        }

        if !jobs.is_empty() {
            tracing::info!("Waiting for {} archive jobs to finish", jobs.len());
        }
        while let Some(finished) = jobs.join_next().await {
            if let Err(e) = finished {
                tracing::error!("Archive task aborted: {}", e);
            }
        }

        summary
    }
}
