use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{
        jobdtos::PaginationQuery,
        notificationdtos::{NotificationOwnerDto, NotificationOwnerQuery},
    },
    error::HttpError,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/:user_id", get(get_user_notifications))
        .route("/:notification_id/read", patch(mark_notification_read))
        .route("/:notification_id", delete(delete_notification))
}

pub async fn get_user_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(20).min(100) as i64;
    let offset = ((page - 1) as i64) * limit;

    let notifications = app_state
        .notification_service
        .get_user_notifications(user_id, limit, offset)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": notifications
    })))
}

pub async fn mark_notification_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(notification_id): Path<Uuid>,
    Json(body): Json<NotificationOwnerDto>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .notification_service
        .mark_notification_read(notification_id, body.user_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": notification
    })))
}

pub async fn delete_notification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(notification_id): Path<Uuid>,
    Query(query): Query<NotificationOwnerQuery>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .notification_service
        .delete_notification(notification_id, query.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
