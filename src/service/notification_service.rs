use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::Config,
    db::{db::DBClient, notificationdb::NotificationExt},
    mail::mails,
    models::notificationmodel::{Notification, NotificationKind},
    realtime::{dispatcher::Dispatcher, events::GatewayEvent},
    service::{error::ServiceError, identity_service::IdentityResolver},
};

/// The single choke point for lifecycle side effects. Every component that
/// wants a user to hear about something goes through `notify`: one stored
/// notification, one live push, one background email.
#[derive(Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
    dispatcher: Dispatcher,
    identity: Arc<IdentityResolver>,
    env: Config,
}

impl NotificationService {
    pub fn new(
        db_client: Arc<DBClient>,
        dispatcher: Dispatcher,
        identity: Arc<IdentityResolver>,
        env: Config,
    ) -> Self {
        Self {
            db_client,
            dispatcher,
            identity,
            env,
        }
    }

    /// Persists the notification synchronously so a follow-up read sees it,
    /// then pushes it to the user's live connections and schedules the email
    /// dispatch. Push and email are best-effort: their failures are logged
    /// and never reach the caller.
    pub async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        job_id: Option<Uuid>,
        link: Option<String>,
    ) -> Result<Notification, ServiceError> {
        let notification = self
            .db_client
            .insert_notification(user_id, title, message, kind, job_id, link)
            .await?;

        tracing::info!(
            "notification stored: kind={} user={}",
            kind.to_str(),
            user_id
        );

        self.dispatcher
            .send_to_user(
                user_id,
                GatewayEvent::NewNotification {
                    notification: notification.clone(),
                },
            )
            .await;

        self.dispatch_email(user_id, title, message, notification.link.clone());

        Ok(notification)
    }

    /// Fire-and-forget email: resolves the recipient's address in the
    /// background and never delays or fails the triggering request.
    fn dispatch_email(&self, user_id: Uuid, title: &str, message: &str, link: Option<String>) {
        let identity = self.identity.clone();
        let env = self.env.clone();
        let subject = title.to_string();
        let body = message.to_string();

        tokio::spawn(async move {
            let contact = identity.resolve(user_id).await;
            if contact.email.is_empty() {
                tracing::debug!("no email on file for user {}, skipping dispatch", user_id);
                return;
            }

            if let Err(err) = mails::send_notification_email(
                &contact.email,
                &subject,
                &body,
                link.as_deref(),
                &env,
            )
            .await
            {
                tracing::error!("email dispatch failed for user {}: {}", user_id, err);
            }
        });
    }

    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ServiceError> {
        let notifications = self
            .db_client
            .get_notifications_for_user(user_id, limit, offset)
            .await?;

        Ok(notifications)
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, ServiceError> {
        let notification = self
            .db_client
            .get_notification_by_id(notification_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))?;

        if notification.user_id != user_id {
            return Err(ServiceError::UnauthorizedNotificationAccess(
                user_id,
                notification_id,
            ));
        }

        let updated = self
            .db_client
            .mark_notification_read(notification_id)
            .await?;

        Ok(updated)
    }

    pub async fn delete_notification(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let notification = self
            .db_client
            .get_notification_by_id(notification_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))?;

        if notification.user_id != user_id {
            return Err(ServiceError::UnauthorizedNotificationAccess(
                user_id,
                notification_id,
            ));
        }

        self.db_client.delete_notification(notification_id).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/workbridge".to_string(),
            app_url: "http://localhost:8000".to_string(),
            port: 8000,
            identity_provider_url: None,
            resend_api_key: String::new(),
            from_email: "Workbridge <noreply@workbridge.app>".to_string(),
        }
    }

    #[tokio::test]
    async fn notification_service_wires_up() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/workbridge")
            .unwrap();
        let db_client = Arc::new(DBClient::new(pool));
        let identity = Arc::new(IdentityResolver::new(db_client.clone(), None));
        let svc = NotificationService::new(db_client, Dispatcher::new(), identity, test_config());

        let _ = svc;
    }
}
