use crate::domain::conversation::{Conversation, ConversationKey, ConversationSummary};
use crate::domain::message::{Message, NewMessage};
use crate::error::Result;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Persistence seam for conversations and messages.
///
/// Every call carries the caller's identity. Implementations apply their own
/// row-level filtering with it, so rows the caller may not see behave as absent.
#[async_trait]
pub trait ChatStore: Send + Sync + std::fmt::Debug {
    /// Exact-match lookup on the key as given.
    async fn find_conversation(&self, caller: Uuid, key: &ConversationKey) -> Result<Option<Conversation>>;

    /// Inserts a conversation for `key`. If a row for the same key already
    /// exists, that row is returned instead of a duplicate.
    async fn insert_conversation(&self, caller: Uuid, key: &ConversationKey) -> Result<Conversation>;

    async fn get_conversation(&self, caller: Uuid, conversation_id: Uuid) -> Result<Option<Conversation>>;

    /// Conversations the caller is on, most recently active first.
    async fn list_conversations(&self, caller: Uuid) -> Result<Vec<ConversationSummary>>;

    async fn touch_conversation(&self, caller: Uuid, conversation_id: Uuid, at: OffsetDateTime) -> Result<()>;

    async fn insert_message(&self, caller: Uuid, message: NewMessage) -> Result<Message>;

    /// Messages of a conversation, newest first with id as tie-break.
    async fn list_messages(&self, caller: Uuid, conversation_id: Uuid) -> Result<Vec<Message>>;

    async fn get_message(&self, caller: Uuid, message_id: Uuid) -> Result<Option<Message>>;

    /// Sets `read_at` to `at` unless it is already set. Returns `None` when the
    /// caller is not allowed to update the row.
    async fn mark_read(&self, caller: Uuid, message_id: Uuid, at: OffsetDateTime) -> Result<Option<Message>>;

    async fn ping(&self) -> Result<()>;
}
