use crate::domain::message::Message;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub content: String,
}

impl SendMessage {
    /// Trims the content and checks it is non-empty and within `max_len` characters.
    ///
    /// # Errors
    /// Returns an error if the trimmed content is empty or too long.
    pub fn into_content(self, max_len: usize) -> Result<String, String> {
        let trimmed = self.content.trim();
        if trimmed.is_empty() {
            return Err("Message content cannot be empty".into());
        }
        if trimmed.chars().count() > max_len {
            return Err(format!("Message content is too long (max {max_len} characters)"));
        }
        Ok(trimmed.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at,
            read_at: message.read_at,
        }
    }
}
