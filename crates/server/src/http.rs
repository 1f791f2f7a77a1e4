//! HTTP endpoints
//!
//! Provider-facing control endpoints plus the agent-facing call API.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use voicebridge_call::CallError;
use voicebridge_core::CallId;

use crate::state::AppState;
use crate::ws;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // provider-facing control endpoints
        .route("/twiml", get(twiml))
        .route("/status", get(status))
        .route("/media-stream", get(ws::media_stream))
        // agent-facing call operations
        .route("/calls", post(initiate_call).get(list_calls))
        .route("/calls/:id/continue", post(continue_call))
        .route("/calls/:id/say", post(speak_only))
        .route("/calls/:id", delete(end_call))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Authority of the configured public URL
fn media_host(public_url: &str) -> &str {
    public_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

/// Control descriptor instructing the provider to open the media stream
fn render_twiml(host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Connect>
    <Stream url="wss://{host}/media-stream"/>
  </Connect>
</Response>
"#
    )
}

/// Call-setup descriptor fetched by the provider on answer
async fn twiml(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_twiml(media_host(&state.config.server.public_url));
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

/// Health check
async fn status() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct InitiateResponse {
    call_id: CallId,
    reply: String,
}

#[derive(Debug, Serialize)]
struct ReplyResponse {
    reply: String,
}

/// Start a new call with an opening message
async fn initiate_call(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<InitiateResponse>, (StatusCode, String)> {
    let (call_id, reply) = state
        .manager
        .initiate(&request.message)
        .await
        .map_err(error_response)?;
    Ok(Json(InitiateResponse { call_id, reply }))
}

/// One more speak-and-listen turn on an existing call
async fn continue_call(
    State(state): State<AppState>,
    Path(id): Path<CallId>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ReplyResponse>, (StatusCode, String)> {
    let reply = state
        .manager
        .continue_call(id, &request.message)
        .await
        .map_err(error_response)?;
    Ok(Json(ReplyResponse { reply }))
}

/// Speak without waiting for a reply
async fn speak_only(
    State(state): State<AppState>,
    Path(id): Path<CallId>,
    Json(request): Json<MessageRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .manager
        .speak_only(id, &request.message)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Say goodbye and hang up
async fn end_call(
    State(state): State<AppState>,
    Path(id): Path<CallId>,
    Json(request): Json<MessageRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .manager
        .end(id, &request.message)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ids of live calls
async fn list_calls(State(state): State<AppState>) -> Json<Vec<CallId>> {
    Json(state.manager.active_call_ids())
}

fn error_response(err: CallError) -> (StatusCode, String) {
    let status = match &err {
        CallError::UnknownCall(_) => StatusCode::NOT_FOUND,
        CallError::InvalidState { .. } => StatusCode::CONFLICT,
        CallError::BindTimeout | CallError::ListenTimeout => StatusCode::GATEWAY_TIMEOUT,
        CallError::Provider(_) | CallError::Upstream(_) | CallError::PeerClosed => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, err.to_string())
}
