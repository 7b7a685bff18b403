use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::User;

#[async_trait]
pub trait UserExt {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, first_name, last_name, phone,
                   skills, latitude, longitude, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
