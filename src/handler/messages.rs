use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        jobdtos::UserQuery,
        messagedtos::{MarkReadDto, SendMessageDto},
    },
    error::HttpError,
    AppState,
};

pub fn messages_handler() -> Router {
    Router::new()
        .route("/", post(send_message))
        .route("/conversations", get(list_conversations))
        .route("/conversation/:conversation_id", get(get_conversation))
        .route("/read", patch(mark_read))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let message = app_state
        .message_service
        .send(body.sender_id, body.recipient_id, body.job_id, &body.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": message
        })),
    ))
}

pub async fn list_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let conversations = app_state
        .message_service
        .list_conversations(query.user_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": conversations
    })))
}

pub async fn get_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .message_service
        .get_conversation(&conversation_id, query.user_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": messages
    })))
}

pub async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<MarkReadDto>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state
        .message_service
        .mark_read(&body.conversation_id, body.reader_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "marked_read": updated }
    })))
}
