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
    dtos::jobdtos::{CreateJobDto, OwnerQuery, PaginationQuery, SaveJobDto, UpdateJobDto, UserQuery},
    error::HttpError,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", post(create_job).get(list_jobs))
        .route("/recommendations/:user_id", get(get_recommendations))
        .route("/saved/:user_id", get(get_saved_jobs))
        .route("/:job_id", get(get_job).patch(update_job).delete(delete_job))
        .route("/:job_id/save", post(save_job).delete(unsave_job))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": job
        })),
    ))
}

pub async fn list_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(20).min(100) as i64;
    let offset = ((page - 1) as i64) * limit;

    let jobs = app_state.job_service.list_jobs(limit, offset).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": jobs
    })))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": job
    })))
}

pub async fn update_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let caller_id = body.client_id;
    let job = app_state
        .job_service
        .update_job(job_id, caller_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": job
    })))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .job_service
        .delete_job(job_id, owner.client_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_recommendations(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let recommendations = app_state.recommendation_service.recommend(user_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": recommendations
    })))
}

pub async fn save_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SaveJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    let saved = app_state.job_service.save_job(body.user_id, job_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": saved
        })),
    ))
}

pub async fn unsave_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Query(user): Query<UserQuery>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.job_service.unsave_job(user.user_id, job_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_saved_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.get_saved_jobs(user_id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": jobs
    })))
}
