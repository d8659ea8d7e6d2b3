use crate::domain::message::Message;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub(crate) id: Uuid,
    pub(crate) conversation_ref: Uuid,
    pub(crate) sender_ref: Uuid,
    pub(crate) content: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) read_at: Option<OffsetDateTime>,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            conversation_id: record.conversation_ref,
            sender_id: record.sender_ref,
            content: record.content,
            created_at: record.created_at,
            read_at: record.read_at,
        }
    }
}
