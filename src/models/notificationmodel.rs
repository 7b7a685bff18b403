use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewApplication,
    ApplicationAccepted,
    ApplicationRejected,
    ApplicationWithdrawn,
    JobStatusChanged,
    JobExpired,
    NewMessage,
}

impl NotificationKind {
    pub fn to_str(&self) -> &str {
        match self {
            NotificationKind::NewApplication => "new_application",
            NotificationKind::ApplicationAccepted => "application_accepted",
            NotificationKind::ApplicationRejected => "application_rejected",
            NotificationKind::ApplicationWithdrawn => "application_withdrawn",
            NotificationKind::JobStatusChanged => "job_status_changed",
            NotificationKind::JobExpired => "job_expired",
            NotificationKind::NewMessage => "new_message",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub job_id: Option<Uuid>,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}
