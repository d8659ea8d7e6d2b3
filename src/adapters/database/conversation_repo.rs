use crate::adapters::database::records::{ConversationRecord, ConversationSummaryRecord};
use crate::domain::conversation::{Conversation, ConversationKey, ConversationSummary};
use crate::error::Result;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

const COLUMNS: &str = "id, participant_a, participant_b, listing_ref, request_ref, last_activity_at, created_at";

#[derive(Clone, Debug, Default)]
pub struct ConversationRepository {}

impl ConversationRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Exact-match lookup. The reversed participant pair is a different key.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_key(
        &self,
        conn: &mut PgConnection,
        key: &ConversationKey,
    ) -> Result<Option<Conversation>> {
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            r"
            SELECT {COLUMNS}
            FROM conversations
            WHERE participant_a = $1
              AND participant_b = $2
              AND listing_ref IS NOT DISTINCT FROM $3
              AND request_ref IS NOT DISTINCT FROM $4
            "
        ))
        .bind(key.participant_a)
        .bind(key.participant_b)
        .bind(key.listing_ref)
        .bind(key.request_ref)
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }

    /// Inserts a new conversation. Returns `None` when a row with the same key
    /// already exists.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the insert fails, including foreign
    /// key and row policy violations.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn insert(&self, conn: &mut PgConnection, key: &ConversationKey) -> Result<Option<Conversation>> {
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            r"
            INSERT INTO conversations (id, participant_a, participant_b, listing_ref, request_ref)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            RETURNING {COLUMNS}
            "
        ))
        .bind(Uuid::now_v7())
        .bind(key.participant_a)
        .bind(key.participant_b)
        .bind(key.listing_ref)
        .bind(key.request_ref)
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }

    /// # Errors
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_id(&self, conn: &mut PgConnection, conversation_id: Uuid) -> Result<Option<Conversation>> {
        let record =
            sqlx::query_as::<_, ConversationRecord>(&format!("SELECT {COLUMNS} FROM conversations WHERE id = $1"))
                .bind(conversation_id)
                .fetch_optional(conn)
                .await?;

        Ok(record.map(Into::into))
    }

    /// Conversations `user_id` is on with their unread counts for that user.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn list_for_participant(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>> {
        let records = sqlx::query_as::<_, ConversationSummaryRecord>(
            r"
            SELECT c.id, c.participant_a, c.participant_b, c.listing_ref, c.request_ref,
                   c.last_activity_at, c.created_at,
                   (
                       SELECT COUNT(*)
                       FROM messages m
                       WHERE m.conversation_ref = c.id
                         AND m.sender_ref <> $1
                         AND m.read_at IS NULL
                   ) AS unread_count
            FROM conversations c
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY c.last_activity_at DESC, c.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// # Errors
    /// Returns `AppError::StoreFailure` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn touch(&self, conn: &mut PgConnection, conversation_id: Uuid, at: OffsetDateTime) -> Result<u64> {
        let result = sqlx::query("UPDATE conversations SET last_activity_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(at)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
