use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::messagemodel::Message;

const MESSAGE_COLUMNS: &str = r#"id, conversation_id, sender_id, recipient_id, job_id, content,
       is_read, read_at, created_at"#;

#[async_trait]
pub trait MessageExt {
    async fn insert_message(
        &self,
        conversation_id: &str,
        sender_id: Uuid,
        recipient_id: Uuid,
        job_id: Option<Uuid>,
        content: String,
    ) -> Result<Message, Error>;

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, Error>;

    /// The newest message of every conversation the user takes part in,
    /// newest conversation first.
    async fn get_latest_messages_per_conversation(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Message>, Error>;

    /// Unread-message tally per conversation for messages addressed to the user.
    async fn get_unread_counts(&self, user_id: Uuid) -> Result<Vec<(String, i64)>, Error>;

    /// Marks every unread message addressed to `reader_id` in the conversation
    /// as read. Returns the number of rows flipped; re-running returns 0.
    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: Uuid,
    ) -> Result<u64, Error>;
}

#[async_trait]
impl MessageExt for DBClient {
    async fn insert_message(
        &self,
        conversation_id: &str,
        sender_id: Uuid,
        recipient_id: Uuid,
        job_id: Option<Uuid>,
        content: String,
    ) -> Result<Message, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (conversation_id, sender_id, recipient_id, job_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(conversation_id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(job_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_latest_messages_per_conversation(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT DISTINCT ON (conversation_id) {MESSAGE_COLUMNS}
            FROM messages
            WHERE sender_id = $1 OR recipient_id = $1
            ORDER BY conversation_id, created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_unread_counts(&self, user_id: Uuid) -> Result<Vec<(String, i64)>, Error> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT conversation_id, COUNT(*)
            FROM messages
            WHERE recipient_id = $1 AND is_read = false
            GROUP BY conversation_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: Uuid,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = true, read_at = NOW()
            WHERE conversation_id = $1
              AND recipient_id = $2
              AND is_read = false
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
