use crate::adapters::database::records::MessageRecord;
use crate::domain::message::{Message, NewMessage};
use crate::error::Result;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct MessageRepository {}

impl MessageRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Records a new message. `created_at` is assigned by the database.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, message))]
    pub(crate) async fn create(&self, conn: &mut PgConnection, message: NewMessage) -> Result<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r"
            INSERT INTO messages (id, conversation_ref, sender_ref, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, conversation_ref, sender_ref, content, created_at, read_at
            ",
        )
        .bind(Uuid::now_v7())
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(message.content)
        .fetch_one(conn)
        .await?;

        Ok(record.into())
    }

    /// # Errors
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn list_for_conversation(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r"
            SELECT id, conversation_ref, sender_ref, content, created_at, read_at
            FROM messages
            WHERE conversation_ref = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(conversation_id)
        .fetch_all(conn)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// # Errors
    /// Returns `AppError::StoreFailure` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_id(&self, conn: &mut PgConnection, message_id: Uuid) -> Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, conversation_ref, sender_ref, content, created_at, read_at FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }

    /// Sets `read_at` once. Returns `None` if no row was updatable.
    ///
    /// # Errors
    /// Returns `AppError::StoreFailure` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn mark_read(
        &self,
        conn: &mut PgConnection,
        message_id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r"
            UPDATE messages
            SET read_at = COALESCE(read_at, $2)
            WHERE id = $1
            RETURNING id, conversation_ref, sender_ref, content, created_at, read_at
            ",
        )
        .bind(message_id)
        .bind(at)
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }
}
