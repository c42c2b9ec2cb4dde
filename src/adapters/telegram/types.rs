//! Wire types for the Telegram Bot API, limited to the fields the bot reads.

use crate::domain::model::{self, ChatId, ImageKind, ImageRef, IncomingMessage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Debug, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

impl Message {
    /// Largest photo rendition, or an image sent as a file.
    fn image(&self) -> Option<ImageRef> {
        if let Some(photos) = &self.photo {
            return photos
                .iter()
                .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
                .map(|p| ImageRef {
                    file_id: p.file_id.clone(),
                    width: p.width,
                    height: p.height,
                    kind: ImageKind::Photo,
                });
        }

        let document = self.document.as_ref()?;
        let is_image = document
            .mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"));
        if !is_image {
            return None;
        }

        let (width, height) = document
            .thumbnail
            .as_ref()
            .map(|t| (t.width, t.height))
            .unwrap_or_default();
        Some(ImageRef {
            file_id: document.file_id.clone(),
            width,
            height,
            kind: ImageKind::Document {
                file_name: document.file_name.clone(),
                mime_type: document.mime_type.clone(),
            },
        })
    }
}

impl From<Message> for IncomingMessage {
    fn from(message: Message) -> Self {
        let image = message.image();
        IncomingMessage {
            message_id: message.message_id,
            chat_id: ChatId(message.chat.id),
            text: message.text,
            image,
        }
    }
}

impl From<Update> for model::Update {
    fn from(update: Update) -> Self {
        model::Update {
            update_id: update.update_id,
            message: update.message.map(IncomingMessage::from),
        }
    }
}

impl From<File> for model::RemoteFile {
    fn from(file: File) -> Self {
        model::RemoteFile {
            file_id: file.file_id,
            file_path: file.file_path,
            file_size: file.file_size,
        }
    }
}

impl From<User> for model::BotIdentity {
    fn from(user: User) -> Self {
        model::BotIdentity {
            id: user.id,
            username: user.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> IncomingMessage {
        serde_json::from_value::<Message>(json).unwrap().into()
    }

    #[test]
    fn test_photo_message_keeps_largest_size() {
        let msg = parse(serde_json::json!({
            "message_id": 10,
            "chat": {"id": 99, "type": "private"},
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 60},
                {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 853},
                {"file_id": "medium", "file_unique_id": "m", "width": 320, "height": 213}
            ],
            "caption": "beach"
        }));

        let image = msg.image.unwrap();
        assert_eq!(image.file_id, "large");
        assert_eq!(image.kind, ImageKind::Photo);
        assert!(msg.text.is_none());
        assert_eq!(msg.chat_id, ChatId(99));
    }

    #[test]
    fn test_image_document_is_an_image() {
        let msg = parse(serde_json::json!({
            "message_id": 11,
            "chat": {"id": 99, "type": "private"},
            "document": {"file_id": "doc", "file_unique_id": "d", "file_name": "scan.png", "mime_type": "image/png"}
        }));

        let image = msg.image.unwrap();
        assert_eq!(image.file_id, "doc");
        assert!(matches!(image.kind, ImageKind::Document { .. }));
    }

    #[test]
    fn test_non_image_document_is_ignored() {
        let msg = parse(serde_json::json!({
            "message_id": 12,
            "chat": {"id": 99, "type": "private"},
            "document": {"file_id": "doc", "file_unique_id": "d", "file_name": "notes.pdf", "mime_type": "application/pdf"}
        }));

        assert!(msg.image.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let resp: ApiResponse<bool> = serde_json::from_value(serde_json::json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}
        }))
        .unwrap();

        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(429));
        assert_eq!(resp.parameters.and_then(|p| p.retry_after), Some(5));
    }
}
