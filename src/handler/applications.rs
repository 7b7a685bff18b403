use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::applicationdtos::{
        AddNoteDto, NoteAuthorQuery, SubmitApplicationDto, UpdateApplicationStatusDto,
        WithdrawQuery,
    },
    error::HttpError,
    AppState,
};

pub fn applications_handler() -> Router {
    Router::new()
        .route("/", post(submit_application))
        .route("/job/:job_id", get(get_applications_for_job))
        .route("/worker/:worker_id", get(get_applications_for_worker))
        .route(
            "/:application_id",
            get(get_application)
                .patch(update_application_status)
                .delete(withdraw_application),
        )
        .route("/:application_id/notes", post(add_note).get(get_notes))
        .route("/:application_id/notes/:note_id", axum::routing::delete(delete_note))
}

/// 201 when this call created the proposal, 200 when it edited the
/// existing one.
pub async fn submit_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SubmitApplicationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state.application_service.submit(body).await?;

    let status = if outcome.inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(serde_json::json!({
            "status": "success",
            "data": outcome.application
        })),
    ))
}

pub async fn get_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .get_application(application_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": application
    })))
}

pub async fn get_applications_for_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .application_service
        .get_applications_for_job(job_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": applications
    })))
}

pub async fn get_applications_for_worker(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(worker_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .application_service
        .get_applications_for_worker(worker_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": applications
    })))
}

pub async fn update_application_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<UpdateApplicationStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .transition_status(application_id, &body.status)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": application
    })))
}

pub async fn withdraw_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
    Query(query): Query<WithdrawQuery>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .application_service
        .withdraw(application_id, query.worker_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_note(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<AddNoteDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let note = app_state
        .application_service
        .add_note(application_id, body.author_id, body.body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": note
        })),
    ))
}

pub async fn get_notes(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
    Query(query): Query<NoteAuthorQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let notes = app_state
        .application_service
        .get_notes(application_id, query.author_id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": notes
    })))
}

pub async fn delete_note(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((application_id, note_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<NoteAuthorQuery>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .application_service
        .delete_note(application_id, note_id, query.author_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
