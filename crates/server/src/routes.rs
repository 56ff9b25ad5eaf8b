use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use shopmate_agent::runtime::AgentRuntime;
use shopmate_core::ChatResponse;

pub const SERVICE_NAME: &str = "shopmate";

#[derive(Clone)]
pub struct AppState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub ok: bool,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .with_state(AppState { runtime })
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo { ok: true, service: SERVICE_NAME })
}

/// One chat body in, one pipeline run, one response out. Pipeline failures
/// surface as 500 with the provider error detail.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiError>)> {
    let request_id = Uuid::new_v4();
    info!(event_name = "api.chat.received", %request_id, "chat request received");

    match state.runtime.run(&body.message).await {
        Ok(response) => {
            info!(
                event_name = "api.chat.completed",
                %request_id,
                intent = response.intent.map(|i| i.as_str()).unwrap_or("none"),
                tool_invoked = response.tool_result.is_some(),
                "chat request completed"
            );
            Ok(Json(response))
        }
        Err(pipeline_error) => {
            error!(
                event_name = "api.chat.failed",
                %request_id,
                error = %pipeline_error,
                "chat pipeline failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: format!("{pipeline_error:#}") }),
            ))
        }
    }
}
