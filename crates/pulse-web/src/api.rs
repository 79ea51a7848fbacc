use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use pulse_core::{ControlService, EngineError};

#[derive(Clone)]
pub struct ApiServer {
    control: Arc<ControlService>,
}

impl ApiServer {
    pub fn new(control: Arc<ControlService>) -> Self {
        Self { control }
    }

    pub async fn serve(self, addr: SocketAddr) -> JoinHandle<()> {
        let router = build_router(self);
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("bind address");
            axum::serve(listener, router).await.expect("server error");
        })
    }
}

pub fn build_router(api: ApiServer) -> Router {
    let cors = tower_http::cors::CorsLayer::very_permissive();
    Router::new()
        .route("/api/work", post(start_work).delete(cancel_all_work))
        .route("/api/work/active", get(get_active_works))
        .route("/api/work/status", get(get_all_work_status))
        .route("/api/work/{name}", axum::routing::delete(stop_work))
        .route(
            "/api/permission",
            get(check_permission).post(request_permission),
        )
        .route("/api/notifications/test", post(send_test_notification))
        .fallback(not_implemented)
        .with_state(api)
        .layer(cors)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartWorkRequest {
    #[serde(default = "default_task_name")]
    task_name: String,
    #[serde(default = "default_interval")]
    interval_seconds: u64,
    #[serde(default = "default_task_type")]
    task_type: String,
}

fn default_task_name() -> String {
    "default_task".to_string()
}

fn default_interval() -> u64 {
    20
}

fn default_task_type() -> String {
    "ping".to_string()
}

#[derive(Serialize)]
struct Confirmation {
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

fn engine_error(err: EngineError) -> Response {
    let status = match err {
        EngineError::NoForegroundContext => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            code: err.code(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

fn confirmation(message: String) -> Response {
    Json(Confirmation { message }).into_response()
}

async fn start_work(
    State(api): State<ApiServer>,
    Json(payload): Json<StartWorkRequest>,
) -> Response {
    match api
        .control
        .start_periodic_work(&payload.task_name, payload.interval_seconds, &payload.task_type)
        .await
    {
        Ok(message) => confirmation(message),
        Err(err) => engine_error(err),
    }
}

async fn stop_work(State(api): State<ApiServer>, Path(name): Path<String>) -> Response {
    match api.control.stop_work(&name).await {
        Ok(message) => confirmation(message),
        Err(err) => engine_error(err),
    }
}

async fn get_active_works(State(api): State<ApiServer>) -> Response {
    match api.control.get_active_works().await {
        Ok(works) => Json(works).into_response(),
        Err(err) => engine_error(err),
    }
}

async fn get_all_work_status(State(api): State<ApiServer>) -> Response {
    match api.control.get_all_work_status().await {
        Ok(statuses) => Json(statuses).into_response(),
        Err(err) => engine_error(err),
    }
}

async fn cancel_all_work(State(api): State<ApiServer>) -> Response {
    match api.control.cancel_all_work().await {
        Ok(message) => confirmation(message),
        Err(err) => engine_error(err),
    }
}

async fn check_permission(State(api): State<ApiServer>) -> Response {
    Json(api.control.check_notification_permission()).into_response()
}

async fn request_permission(State(api): State<ApiServer>) -> Response {
    match api.control.request_notification_permission().await {
        Ok(message) => confirmation(message),
        Err(err) => engine_error(err),
    }
}

async fn send_test_notification(State(api): State<ApiServer>) -> Response {
    match api.control.send_test_notification().await {
        Ok(message) => confirmation(message),
        Err(err) => engine_error(err),
    }
}

/// Unrecognized requests answer "not implemented" instead of failing the
/// caller's channel.
async fn not_implemented() -> Response {
    (StatusCode::NOT_IMPLEMENTED, "not implemented").into_response()
}
