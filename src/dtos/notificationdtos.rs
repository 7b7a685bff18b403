use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NotificationOwnerDto {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct NotificationOwnerQuery {
    pub user_id: Uuid,
}
