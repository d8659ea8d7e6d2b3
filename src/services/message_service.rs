use crate::domain::message::{Message, NewMessage};
use crate::domain::policy::{self, Action, ReadRule, Resource};
use crate::error::{AppError, Result};
use crate::services::chat_store::ChatStore;
use crate::services::denials::DenialRecorder;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    sent_total: Counter<u64>,
    read_total: Counter<u64>,
    list_size: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("nearlink-chat");
        Self {
            sent_total: meter
                .u64_counter("nearlink_messages_sent_total")
                .with_description("Total send attempts by outcome")
                .build(),
            read_total: meter
                .u64_counter("nearlink_messages_read_total")
                .with_description("Messages transitioned to read")
                .build(),
            list_size: meter
                .u64_histogram("nearlink_message_list_size")
                .with_description("Number of messages returned by a single list call")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageService {
    store: Arc<dyn ChatStore>,
    read_rule: ReadRule,
    metrics: Metrics,
    denials: DenialRecorder,
}

impl MessageService {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>, read_rule: ReadRule) -> Self {
        Self { store, read_rule, metrics: Metrics::new(), denials: DenialRecorder::new() }
    }

    /// Appends a message to a conversation and bumps its last activity.
    ///
    /// The bump is a second write; if it fails the message is still returned.
    /// Content is stored as given.
    ///
    /// # Errors
    /// Returns `AppError::Forbidden` if `caller` is not `sender_id`, or the sender
    /// is not a participant, or the conversation is not visible to the caller.
    /// Returns `AppError::StoreFailure` if the insert fails.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, content),
        fields(content_len = content.len())
    )]
    pub async fn send(&self, caller: Uuid, conversation_id: Uuid, sender_id: Uuid, content: String) -> Result<Message> {
        let Some(conversation) = self.store.get_conversation(caller, conversation_id).await? else {
            self.denials.record(Resource::Message, Action::Create);
            return Err(AppError::Forbidden);
        };

        if !policy::can_create_message(caller, &conversation, sender_id) {
            self.denials.record(Resource::Message, Action::Create);
            return Err(AppError::Forbidden);
        }

        let message = match self.store.insert_message(caller, NewMessage { conversation_id, sender_id, content }).await {
            Ok(message) => {
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "success")]);
                message
            }
            Err(e) => {
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "failure")]);
                return Err(e);
            }
        };

        if let Err(e) = self.store.touch_conversation(caller, conversation_id, OffsetDateTime::now_utc()).await {
            tracing::warn!(error = %e, message_id = %message.id, "Failed to bump conversation activity");
        }

        tracing::debug!(message_id = %message.id, "Message stored");
        Ok(message)
    }

    /// All messages of a conversation, newest first.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the conversation is not visible to the caller.
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(err(level = "debug"), skip(self))]
    pub async fn list(&self, caller: Uuid, conversation_id: Uuid) -> Result<Vec<Message>> {
        let conversation = self.store.get_conversation(caller, conversation_id).await?.ok_or(AppError::NotFound)?;

        if !policy::can_read_message(caller, &conversation) {
            self.denials.record(Resource::Message, Action::Read);
            return Err(AppError::NotFound);
        }

        let messages = self.store.list_messages(caller, conversation_id).await?;
        self.metrics.list_size.record(messages.len() as u64, &[]);

        Ok(messages)
    }

    /// Marks a message as read by `caller`. An already-read message is
    /// returned unchanged.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the message is not visible to the caller.
    /// Returns `AppError::Forbidden` if the read rule rejects the caller.
    /// Returns `AppError::StoreFailure` if the update fails.
    #[tracing::instrument(err(level = "debug"), skip(self), fields(read_rule = ?self.read_rule))]
    pub async fn mark_read(&self, caller: Uuid, message_id: Uuid) -> Result<Message> {
        let message = self.store.get_message(caller, message_id).await?.ok_or(AppError::NotFound)?;
        let conversation =
            self.store.get_conversation(caller, message.conversation_id).await?.ok_or(AppError::NotFound)?;

        if !policy::can_mark_read(caller, &conversation, &message, self.read_rule) {
            self.denials.record(Resource::Message, Action::Update);
            return Err(AppError::Forbidden);
        }

        if message.is_read() {
            return Ok(message);
        }

        let Some(updated) = self.store.mark_read(caller, message_id, OffsetDateTime::now_utc()).await? else {
            self.denials.record(Resource::Message, Action::Update);
            return Err(AppError::Forbidden);
        };

        self.metrics.read_total.add(1, &[]);
        Ok(updated)
    }
}
