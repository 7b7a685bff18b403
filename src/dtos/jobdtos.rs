use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    pub client_id: Uuid,

    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[serde(default)]
    pub skills: Vec<String>,

    #[validate(range(min = 0.0, message = "Budget must be positive"))]
    pub budget: f64,

    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub expires_at: Option<DateTime<Utc>>,
    pub auto_close_enabled: Option<bool>,
}

/// Partial update; `client_id` is the caller's claim of ownership and
/// `status` goes through the transition table when present.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateJobDto {
    pub client_id: Option<Uuid>,

    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 characters"))]
    pub description: Option<String>,

    pub category: Option<String>,
    pub skills: Option<Vec<String>>,

    #[validate(range(min = 0.0, message = "Budget must be positive"))]
    pub budget: Option<f64>,

    pub location: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub auto_close_enabled: Option<bool>,

    // Raw string so an unknown status yields a 400, not a body rejection
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SaveJobDto {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
