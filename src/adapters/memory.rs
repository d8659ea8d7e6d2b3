use crate::domain::conversation::{Conversation, ConversationKey, ConversationSummary};
use crate::domain::message::{Message, NewMessage};
use crate::domain::policy::{self, ReadRule};
use crate::error::{AppError, Result};
use crate::services::chat_store::ChatStore;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Message>,
}

impl State {
    fn visible_conversation(&self, caller: Uuid, conversation_id: Uuid) -> Option<&Conversation> {
        self.conversations.get(&conversation_id).filter(|c| policy::can_read_conversation(caller, c))
    }
}

/// Process-local store used for development and tests.
///
/// Reads and writes are checked with the same predicates the Postgres row policies
/// express, so invisible rows behave as absent. Deletion helpers stand in for
/// the foreign key cascades of the platform tables.
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    state: RwLock<State>,
    read_rule: ReadRule,
}

impl MemoryChatStore {
    #[must_use]
    pub fn new(read_rule: ReadRule) -> Self {
        Self { state: RwLock::default(), read_rule }
    }

    /// Total conversations stored, regardless of visibility.
    pub async fn conversation_count(&self) -> usize {
        self.state.read().await.conversations.len()
    }

    /// Removes a conversation and every message it owns.
    pub async fn delete_conversation(&self, conversation_id: Uuid) -> bool {
        self.delete_conversations_where(|c| c.id == conversation_id).await == 1
    }

    /// Removes every conversation `user_id` is on, with their messages.
    pub async fn delete_user(&self, user_id: Uuid) -> usize {
        self.delete_conversations_where(|c| c.has_participant(user_id)).await
    }

    /// Removes every conversation about `listing_id`, with their messages.
    pub async fn delete_listing(&self, listing_id: Uuid) -> usize {
        self.delete_conversations_where(|c| c.listing_ref == Some(listing_id)).await
    }

    /// Removes every conversation about `request_id`, with their messages.
    pub async fn delete_request(&self, request_id: Uuid) -> usize {
        self.delete_conversations_where(|c| c.request_ref == Some(request_id)).await
    }

    async fn delete_conversations_where(&self, doomed: impl Fn(&Conversation) -> bool + Send) -> usize {
        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = state.conversations.values().filter(|c| doomed(*c)).map(|c| c.id).collect();
        for id in &ids {
            state.conversations.remove(id);
        }
        state.messages.retain(|_, m| !ids.contains(&m.conversation_id));
        ids.len()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn find_conversation(&self, caller: Uuid, key: &ConversationKey) -> Result<Option<Conversation>> {
        let state = self.state.read().await;
        Ok(state
            .conversations
            .values()
            .find(|c| key.matches(c) && policy::can_read_conversation(caller, c))
            .cloned())
    }

    async fn insert_conversation(&self, caller: Uuid, key: &ConversationKey) -> Result<Conversation> {
        if !policy::can_create_conversation(caller, key) {
            return Err(AppError::Forbidden);
        }

        let mut state = self.state.write().await;
        if let Some(existing) = state.conversations.values().find(|c| key.matches(c)) {
            return Ok(existing.clone());
        }

        let now = OffsetDateTime::now_utc();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            participant_a: key.participant_a,
            participant_b: key.participant_b,
            listing_ref: key.listing_ref,
            request_ref: key.request_ref,
            last_activity_at: now,
            created_at: now,
        };
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, caller: Uuid, conversation_id: Uuid) -> Result<Option<Conversation>> {
        let state = self.state.read().await;
        Ok(state.visible_conversation(caller, conversation_id).cloned())
    }

    async fn list_conversations(&self, caller: Uuid) -> Result<Vec<ConversationSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .values()
            .filter(|c| policy::can_read_conversation(caller, c))
            .map(|c| {
                let unread = state
                    .messages
                    .values()
                    .filter(|m| m.conversation_id == c.id && m.sender_id != caller && !m.is_read())
                    .count();
                ConversationSummary { conversation: c.clone(), unread_count: i64::try_from(unread).unwrap_or(i64::MAX) }
            })
            .collect();

        summaries.sort_by_key(|s| Reverse((s.conversation.last_activity_at, s.conversation.id)));
        Ok(summaries)
    }

    async fn touch_conversation(&self, caller: Uuid, conversation_id: Uuid, at: OffsetDateTime) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(conversation) = state.conversations.get_mut(&conversation_id)
            && policy::can_update_conversation(caller, conversation)
        {
            conversation.last_activity_at = at;
        }
        Ok(())
    }

    async fn insert_message(&self, caller: Uuid, message: NewMessage) -> Result<Message> {
        let mut state = self.state.write().await;
        let allowed = state
            .conversations
            .get(&message.conversation_id)
            .is_some_and(|c| policy::can_create_message(caller, c, message.sender_id));
        if !allowed {
            return Err(AppError::Forbidden);
        }

        let stored = Message {
            id: Uuid::now_v7(),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: OffsetDateTime::now_utc(),
            read_at: None,
        };
        state.messages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_messages(&self, caller: Uuid, conversation_id: Uuid) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        if state.visible_conversation(caller, conversation_id).is_none() {
            return Ok(Vec::new());
        }

        let mut messages: Vec<Message> =
            state.messages.values().filter(|m| m.conversation_id == conversation_id).cloned().collect();
        messages.sort_by_key(|m| Reverse((m.created_at, m.id)));
        Ok(messages)
    }

    async fn get_message(&self, caller: Uuid, message_id: Uuid) -> Result<Option<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .get(&message_id)
            .filter(|m| state.visible_conversation(caller, m.conversation_id).is_some())
            .cloned())
    }

    async fn mark_read(&self, caller: Uuid, message_id: Uuid, at: OffsetDateTime) -> Result<Option<Message>> {
        let mut state = self.state.write().await;
        let Some(conversation) = state
            .messages
            .get(&message_id)
            .and_then(|m| state.visible_conversation(caller, m.conversation_id))
            .cloned()
        else {
            return Ok(None);
        };

        let Some(message) = state.messages.get_mut(&message_id) else {
            return Ok(None);
        };
        if !policy::can_mark_read(caller, &conversation, message, self.read_rule) {
            return Ok(None);
        }

        if message.read_at.is_none() {
            message.read_at = Some(at);
        }
        Ok(Some(message.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_returns_existing_row_for_same_key() {
        let store = MemoryChatStore::default();
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4(), Some(Uuid::new_v4()), None);

        let first = store.insert_conversation(key.participant_a, &key).await.unwrap();
        let second = store.insert_conversation(key.participant_b, &key).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn test_rows_are_invisible_to_outsiders() {
        let store = MemoryChatStore::default();
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4(), None, None);
        let conversation = store.insert_conversation(key.participant_a, &key).await.unwrap();
        let message = store
            .insert_message(
                key.participant_a,
                NewMessage {
                    conversation_id: conversation.id,
                    sender_id: key.participant_a,
                    content: "hello".into(),
                },
            )
            .await
            .unwrap();

        let outsider = Uuid::new_v4();
        assert!(store.find_conversation(outsider, &key).await.unwrap().is_none());
        assert!(store.get_conversation(outsider, conversation.id).await.unwrap().is_none());
        assert!(store.list_messages(outsider, conversation.id).await.unwrap().is_empty());
        assert!(store.get_message(outsider, message.id).await.unwrap().is_none());
        assert!(store.mark_read(outsider, message.id, OffsetDateTime::now_utc()).await.unwrap().is_none());
        assert!(store.list_conversations(outsider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_message_checks_sender() {
        let store = MemoryChatStore::default();
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4(), None, None);
        let conversation = store.insert_conversation(key.participant_a, &key).await.unwrap();

        let spoofed = store
            .insert_message(
                key.participant_a,
                NewMessage { conversation_id: conversation.id, sender_id: key.participant_b, content: "x".into() },
            )
            .await;
        assert!(matches!(spoofed, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_mark_read_never_moves_read_at() {
        let store = MemoryChatStore::default();
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4(), None, None);
        let conversation = store.insert_conversation(key.participant_a, &key).await.unwrap();
        let message = store
            .insert_message(
                key.participant_a,
                NewMessage { conversation_id: conversation.id, sender_id: key.participant_a, content: "x".into() },
            )
            .await
            .unwrap();

        let first_at = OffsetDateTime::now_utc();
        let first = store.mark_read(key.participant_b, message.id, first_at).await.unwrap().unwrap();
        let later = first_at + time::Duration::minutes(5);
        let second = store.mark_read(key.participant_b, message.id, later).await.unwrap().unwrap();

        assert_eq!(first.read_at, Some(first_at));
        assert_eq!(second.read_at, Some(first_at));
    }

    #[tokio::test]
    async fn test_delete_conversation_cascades_to_messages() {
        let store = MemoryChatStore::default();
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4(), None, None);
        let conversation = store.insert_conversation(key.participant_a, &key).await.unwrap();
        let message = store
            .insert_message(
                key.participant_a,
                NewMessage { conversation_id: conversation.id, sender_id: key.participant_a, content: "x".into() },
            )
            .await
            .unwrap();

        assert!(store.delete_conversation(conversation.id).await);
        assert!(store.get_message(key.participant_a, message.id).await.unwrap().is_none());
        assert_eq!(store.delete_user(key.participant_a).await, 0);
    }

    #[tokio::test]
    async fn test_mark_read_applies_configured_rule() {
        let key = ConversationKey::new(Uuid::new_v4(), Uuid::new_v4(), None, None);
        let now = OffsetDateTime::now_utc();

        for (rule, expect_marked) in [(ReadRule::SecondParticipant, false), (ReadRule::Recipient, true)] {
            let store = MemoryChatStore::new(rule);
            let conversation = store.insert_conversation(key.participant_a, &key).await.unwrap();
            let from_b = store
                .insert_message(
                    key.participant_b,
                    NewMessage { conversation_id: conversation.id, sender_id: key.participant_b, content: "x".into() },
                )
                .await
                .unwrap();

            let marked = store.mark_read(key.participant_a, from_b.id, now).await.unwrap();
            assert_eq!(marked.is_some(), expect_marked, "rule {rule:?}");

            let stored = store.get_message(key.participant_b, from_b.id).await.unwrap().unwrap();
            assert_eq!(stored.is_read(), expect_marked, "rule {rule:?}");
        }
    }

    #[tokio::test]
    async fn test_delete_listing_and_request_cascade() {
        let store = MemoryChatStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (listing, request) = (Uuid::new_v4(), Uuid::new_v4());
        let about_listing = ConversationKey::new(a, b, Some(listing), None);
        let about_request = ConversationKey::new(a, b, None, Some(request));
        let direct = ConversationKey::new(a, b, None, None);

        let listing_conversation = store.insert_conversation(a, &about_listing).await.unwrap();
        store.insert_conversation(a, &about_request).await.unwrap();
        store.insert_conversation(a, &direct).await.unwrap();
        let message = store
            .insert_message(
                a,
                NewMessage { conversation_id: listing_conversation.id, sender_id: a, content: "x".into() },
            )
            .await
            .unwrap();

        assert_eq!(store.delete_listing(listing).await, 1);
        assert!(store.get_message(a, message.id).await.unwrap().is_none());
        assert_eq!(store.delete_request(request).await, 1);
        assert_eq!(store.delete_request(request).await, 0);

        let remaining = store.list_conversations(a).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(direct.matches(&remaining[0].conversation));
    }
}
