use super::types::{ApiResponse, File, Update, User};
use crate::domain::model::{self, BotCommand, BotIdentity, ChatId, RemoteFile};
use crate::domain::ports::BotApi;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll timeout before the HTTP client gives up.
const POLL_MARGIN: Duration = Duration::from_secs(15);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

// reqwest 的錯誤訊息會帶上 URL，而 URL 裡有 token
fn without_url(error: reqwest::Error) -> BotError {
    BotError::Http(error.without_url())
}

/// Bot API client over plain HTTPS.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + POLL_MARGIN)
            .build()
            .map_err(without_url)?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.token, file_path)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T> {
        tracing::debug!("Calling Telegram method {}", method);
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(without_url)?;

        parse_response(method, response).await
    }
}

async fn parse_response<T: DeserializeOwned>(method: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await.map_err(without_url)?;

    let envelope: ApiResponse<T> = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(BotError::Telegram {
                code: i64::from(status.as_u16()),
                description: status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
                retry_after: None,
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !envelope.ok {
        let retry_after = envelope.parameters.as_ref().and_then(|p| p.retry_after);
        tracing::debug!(
            "Telegram method {} failed with code {:?}",
            method,
            envelope.error_code
        );
        return Err(BotError::Telegram {
            code: envelope
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16())),
            description: envelope.description.unwrap_or_default(),
            retry_after,
        });
    }

    envelope.result.ok_or_else(|| BotError::ProcessingError {
        message: format!("Telegram method {} returned no result", method),
    })
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_me(&self) -> Result<BotIdentity> {
        let user: User = self.call("getMe", &json!({})).await?;
        Ok(user.into())
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let _: bool = self
            .call("setMyCommands", &json!({ "commands": commands }))
            .await?;
        Ok(())
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<model::Update>> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &json!({
                    "offset": offset,
                    "timeout": timeout_secs,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        Ok(updates.into_iter().map(model::Update::from).collect())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let _: Value = self
            .call("sendMessage", &json!({ "chat_id": chat_id.0, "text": text }))
            .await?;
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile> {
        let file: File = self.call("getFile", &json!({ "file_id": file_id })).await?;
        Ok(file.into())
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.file_url(file_path))
            .timeout(TRANSFER_TIMEOUT)
            .send()
            .await
            .map_err(without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Telegram {
                code: i64::from(status.as_u16()),
                description: format!("file download failed for {}", file_path),
                retry_after: None,
            });
        }

        let bytes = response.bytes().await.map_err(without_url)?;
        Ok(bytes.to_vec())
    }

    async fn send_document(&self, chat_id: ChatId, file_name: &str, data: Vec<u8>) -> Result<()> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("application/zip")
            .map_err(without_url)?;
        let form = Form::new()
            .text("chat_id", chat_id.0.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .timeout(TRANSFER_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .map_err(without_url)?;

        let _: Value = parse_response("sendDocument", response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&server.base_url(), "123:TEST", Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_get_updates_sends_offset_and_maps_messages() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bot123:TEST/getUpdates")
                .json_body_partial(r#"{"offset": 8, "timeout": 1}"#);
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "result": [{
                    "update_id": 8,
                    "message": {
                        "message_id": 1,
                        "chat": {"id": 5, "type": "private"},
                        "text": "/startcollect"
                    }
                }]
            }));
        });

        let updates = client(&server).get_updates(8, 1).await.unwrap();

        api_mock.assert();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 8);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat_id, ChatId(5));
        assert_eq!(message.text.as_deref(), Some("/startcollect"));
    }

    #[tokio::test]
    async fn test_error_envelope_maps_to_telegram_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bot123:TEST/sendMessage");
            then.status(429).json_body(serde_json::json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 3",
                "parameters": {"retry_after": 3}
            }));
        });

        let err = client(&server)
            .send_message(ChatId(5), "hi")
            .await
            .unwrap_err();

        match err {
            BotError::Telegram {
                code, retry_after, ..
            } => {
                assert_eq!(code, 429);
                assert_eq!(retry_after, Some(3));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_failure_uses_http_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bot123:TEST/getMe");
            then.status(502).body("Bad Gateway");
        });

        let err = client(&server).get_me().await.unwrap_err();
        assert!(matches!(err, BotError::Telegram { code: 502, .. }));
    }

    #[tokio::test]
    async fn test_download_file_uses_file_endpoint() {
        let server = MockServer::start();
        let file_mock = server.mock(|when, then| {
            when.method(GET).path("/file/bot123:TEST/photos/file_1.jpg");
            then.status(200).body("jpeg-bytes");
        });

        let data = client(&server)
            .download_file("photos/file_1.jpg")
            .await
            .unwrap();

        file_mock.assert();
        assert_eq!(data, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_send_document_posts_multipart() {
        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bot123:TEST/sendDocument")
                .body_contains("name=\"document\"; filename=\"trip.zip\"");
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "result": {"message_id": 3, "chat": {"id": 5, "type": "private"}}
            }));
        });

        client(&server)
            .send_document(ChatId(5), "trip.zip", b"PK".to_vec())
            .await
            .unwrap();

        upload_mock.assert();
    }

    #[test]
    fn test_debug_redacts_token() {
        let client =
            TelegramClient::new(DEFAULT_API_URL, "123:SECRET", Duration::from_secs(30)).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("SECRET"));
    }
}
