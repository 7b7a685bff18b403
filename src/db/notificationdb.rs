use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::notificationmodel::{Notification, NotificationKind};

const NOTIFICATION_COLUMNS: &str =
    r#"id, user_id, title, message, kind, job_id, link, is_read, created_at"#;

#[async_trait]
pub trait NotificationExt {
    async fn insert_notification(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        job_id: Option<Uuid>,
        link: Option<String>,
    ) -> Result<Notification, Error>;

    async fn get_notifications_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, Error>;

    async fn get_notification_by_id(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, Error>;

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, Error>;

    async fn delete_notification(&self, notification_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn insert_notification(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        job_id: Option<Uuid>,
        link: Option<String>,
    ) -> Result<Notification, Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, title, message, kind, job_id, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(job_id)
        .bind(link)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_notifications_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_notification_by_id(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE id = $1
            "#
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_notification(&self, notification_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
