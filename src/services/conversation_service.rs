use crate::config::ConversationConfig;
use crate::domain::conversation::{Conversation, ConversationKey, ConversationSummary};
use crate::domain::policy::{self, Action, Resource};
use crate::error::{AppError, Result};
use crate::services::chat_store::ChatStore;
use crate::services::denials::DenialRecorder;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    resolved_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("nearlink-chat");
        Self {
            resolved_total: meter
                .u64_counter("nearlink_conversations_resolved_total")
                .with_description("Conversation resolutions, split by whether a row was created")
                .build(),
        }
    }
}

/// Finds or creates the conversation for a participant pair and optional item.
#[derive(Clone, Debug)]
pub struct ConversationService {
    store: Arc<dyn ChatStore>,
    config: ConversationConfig,
    metrics: Metrics,
    denials: DenialRecorder,
}

impl ConversationService {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>, config: ConversationConfig) -> Self {
        Self { store, config, metrics: Metrics::new(), denials: DenialRecorder::new() }
    }

    /// Returns the id of the conversation between `user_id` and `other_user_id`
    /// about the given item, creating it on first contact.
    ///
    /// `user_id` is the authenticated caller. Self-conversations and requests
    /// carrying both refs are not rejected here.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the lookup or insert fails.
    pub async fn resolve_or_create(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        listing_ref: Option<Uuid>,
        request_ref: Option<Uuid>,
    ) -> Result<Uuid> {
        let conversation = self.resolve_conversation(user_id, other_user_id, listing_ref, request_ref).await?;
        Ok(conversation.id)
    }

    /// Same as [`Self::resolve_or_create`] but returns the full row.
    ///
    /// # Errors
    /// Returns `AppError::Forbidden` if the caller is not on the resolved key.
    /// Returns `AppError::StoreFailure` if the lookup or insert fails.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self),
        fields(participant_order = ?self.config.participant_order)
    )]
    pub async fn resolve_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        listing_ref: Option<Uuid>,
        request_ref: Option<Uuid>,
    ) -> Result<Conversation> {
        let key = ConversationKey::new(user_id, other_user_id, listing_ref, request_ref)
            .ordered(self.config.participant_order);

        if !policy::can_create_conversation(user_id, &key) {
            self.denials.record(Resource::Conversation, Action::Create);
            return Err(AppError::Forbidden);
        }

        if let Some(existing) = self.store.find_conversation(user_id, &key).await? {
            tracing::debug!(conversation_id = %existing.id, "Resolved existing conversation");
            self.metrics.resolved_total.add(1, &[KeyValue::new("outcome", "existing")]);
            return Ok(existing);
        }

        let created = self.store.insert_conversation(user_id, &key).await?;
        tracing::info!(conversation_id = %created.id, "Conversation created");
        self.metrics.resolved_total.add(1, &[KeyValue::new("outcome", "created")]);
        Ok(created)
    }

    /// Fetches a conversation the caller participates in.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if it does not exist or is not visible to the caller.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn get(&self, caller: Uuid, conversation_id: Uuid) -> Result<Conversation> {
        let conversation = self.store.get_conversation(caller, conversation_id).await?.ok_or(AppError::NotFound)?;

        if !policy::can_read_conversation(caller, &conversation) {
            self.denials.record(Resource::Conversation, Action::Read);
            return Err(AppError::NotFound);
        }

        Ok(conversation)
    }

    /// The caller's inbox, most recently active first.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn list_for_user(&self, caller: Uuid) -> Result<Vec<ConversationSummary>> {
        let summaries = self.store.list_conversations(caller).await?;

        Ok(summaries.into_iter().filter(|s| policy::can_read_conversation(caller, &s.conversation)).collect())
    }
}
