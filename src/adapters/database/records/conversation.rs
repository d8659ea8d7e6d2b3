use crate::domain::conversation::{Conversation, ConversationSummary};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationRecord {
    pub(crate) id: Uuid,
    pub(crate) participant_a: Uuid,
    pub(crate) participant_b: Uuid,
    pub(crate) listing_ref: Option<Uuid>,
    pub(crate) request_ref: Option<Uuid>,
    pub(crate) last_activity_at: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
}

impl From<ConversationRecord> for Conversation {
    fn from(record: ConversationRecord) -> Self {
        Self {
            id: record.id,
            participant_a: record.participant_a,
            participant_b: record.participant_b,
            listing_ref: record.listing_ref,
            request_ref: record.request_ref,
            last_activity_at: record.last_activity_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationSummaryRecord {
    #[sqlx(flatten)]
    pub(crate) conversation: ConversationRecord,
    pub(crate) unread_count: i64,
}

impl From<ConversationSummaryRecord> for ConversationSummary {
    fn from(record: ConversationSummaryRecord) -> Self {
        Self { conversation: record.conversation.into(), unread_count: record.unread_count }
    }
}
