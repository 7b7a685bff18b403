use std::sync::Arc;

use axum::{
    extract::WebSocketUpgrade,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        applications::applications_handler, jobs::jobs_handler, messages::messages_handler,
        notifications::notifications_handler,
    },
    realtime::connection::handle_socket,
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/jobs", jobs_handler())
        .nest("/applications", applications_handler())
        .nest("/messages", messages_handler())
        .nest("/notifications", notifications_handler());

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_upgrade))
        .nest("/api", api_route)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "message": "Proposal and job lifecycle API"
    }))
}

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Extension(app_state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}
