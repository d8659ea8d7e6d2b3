use crate::adapters::database::DbPool;
use crate::adapters::database::conversation_repo::ConversationRepository;
use crate::adapters::database::message_repo::MessageRepository;
use crate::domain::conversation::{Conversation, ConversationKey, ConversationSummary};
use crate::domain::message::{Message, NewMessage};
use crate::domain::policy::ReadRule;
use crate::error::{AppError, Result};
use crate::services::chat_store::ChatStore;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Postgres-backed store. Each call runs in its own transaction as
/// `nearlink_app`, with the caller id and read rule published to the
/// row-level policies.
#[derive(Clone, Debug)]
pub struct PgChatStore {
    pool: DbPool,
    read_rule: ReadRule,
    conversations: ConversationRepository,
    messages: MessageRepository,
}

impl PgChatStore {
    #[must_use]
    pub const fn new(pool: DbPool, read_rule: ReadRule) -> Self {
        Self { pool, read_rule, conversations: ConversationRepository::new(), messages: MessageRepository::new() }
    }

    async fn begin_as(&self, caller: Uuid) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        // Row policies do not bind superusers or BYPASSRLS roles.
        sqlx::query("SET LOCAL ROLE nearlink_app").execute(&mut *tx).await?;
        sqlx::query("SELECT set_config('nearlink.caller_id', $1, true), set_config('nearlink.read_rule', $2, true)")
            .bind(caller.to_string())
            .bind(self.read_rule.as_str())
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn find_conversation(&self, caller: Uuid, key: &ConversationKey) -> Result<Option<Conversation>> {
        let mut tx = self.begin_as(caller).await?;
        let conversation = self.conversations.find_by_key(&mut tx, key).await?;
        tx.commit().await?;
        Ok(conversation)
    }

    async fn insert_conversation(&self, caller: Uuid, key: &ConversationKey) -> Result<Conversation> {
        let mut tx = self.begin_as(caller).await?;
        let conversation = match self.conversations.insert(&mut tx, key).await? {
            Some(created) => created,
            None => {
                // Lost a race with another first contact for the same key.
                tracing::debug!("Conversation insert conflicted, reading existing row");
                self.conversations.find_by_key(&mut tx, key).await?.ok_or(AppError::Internal)?
            }
        };
        tx.commit().await?;
        Ok(conversation)
    }

    async fn get_conversation(&self, caller: Uuid, conversation_id: Uuid) -> Result<Option<Conversation>> {
        let mut tx = self.begin_as(caller).await?;
        let conversation = self.conversations.find_by_id(&mut tx, conversation_id).await?;
        tx.commit().await?;
        Ok(conversation)
    }

    async fn list_conversations(&self, caller: Uuid) -> Result<Vec<ConversationSummary>> {
        let mut tx = self.begin_as(caller).await?;
        let summaries = self.conversations.list_for_participant(&mut tx, caller).await?;
        tx.commit().await?;
        Ok(summaries)
    }

    async fn touch_conversation(&self, caller: Uuid, conversation_id: Uuid, at: OffsetDateTime) -> Result<()> {
        let mut tx = self.begin_as(caller).await?;
        let updated = self.conversations.touch(&mut tx, conversation_id, at).await?;
        tx.commit().await?;
        if updated == 0 {
            tracing::debug!(%conversation_id, "Activity bump matched no visible conversation");
        }
        Ok(())
    }

    async fn insert_message(&self, caller: Uuid, message: NewMessage) -> Result<Message> {
        let mut tx = self.begin_as(caller).await?;
        let message = self.messages.create(&mut tx, message).await?;
        tx.commit().await?;
        Ok(message)
    }

    async fn list_messages(&self, caller: Uuid, conversation_id: Uuid) -> Result<Vec<Message>> {
        let mut tx = self.begin_as(caller).await?;
        let messages = self.messages.list_for_conversation(&mut tx, conversation_id).await?;
        tx.commit().await?;
        Ok(messages)
    }

    async fn get_message(&self, caller: Uuid, message_id: Uuid) -> Result<Option<Message>> {
        let mut tx = self.begin_as(caller).await?;
        let message = self.messages.find_by_id(&mut tx, message_id).await?;
        tx.commit().await?;
        Ok(message)
    }

    async fn mark_read(&self, caller: Uuid, message_id: Uuid, at: OffsetDateTime) -> Result<Option<Message>> {
        let mut tx = self.begin_as(caller).await?;
        let message = self.messages.mark_read(&mut tx, message_id, at).await?;
        tx.commit().await?;
        Ok(message)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
