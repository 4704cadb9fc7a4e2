use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fashiondesk_agent::intent::Intent;
use fashiondesk_agent::runtime::{AgentRuntime, DispatchFailure, SAMPLE_QUESTION};
use fashiondesk_core::errors::{ApplicationError, InterfaceError};
use fashiondesk_db::OrderStore;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Absent and `null` both mean no prior conversation.
    #[serde(default)]
    pub history: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent: Intent,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub intent: Intent,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

impl ErrorBody {
    fn from_interface(code: &'static str, error: &InterfaceError) -> Self {
        Self {
            code,
            message: error.message().to_string(),
            correlation_id: error.correlation_id().to_string(),
        }
    }
}

fn dispatch_error(failure: &DispatchFailure, correlation_id: &str) -> ErrorBody {
    let interface =
        ApplicationError::Generation(failure.to_string()).into_interface(correlation_id);
    ErrorBody::from_interface(failure.code(), &interface)
}

fn bad_request(message: String, correlation_id: &str) -> Response {
    let interface = InterfaceError::bad_request(message, correlation_id);
    warn!(
        event_name = "http.request.rejected",
        correlation_id = %correlation_id,
        reason = %interface.message(),
        "rejected malformed request"
    );
    let body = ErrorEnvelope { error: ErrorBody::from_interface(interface.code(), &interface) };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn router(runtime: Arc<AgentRuntime>, store: Arc<OrderStore>) -> Router {
    Router::new()
        .route("/test", get(check_intent))
        .route("/chat", post(chat))
        .with_state(AppState { runtime })
        .merge(health::router(store))
        .layer(TraceLayer::new_for_http())
}

async fn check_intent(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!("http.test", correlation_id = %correlation_id);

    match state.runtime.check_intent(SAMPLE_QUESTION).instrument(span).await {
        Ok(intent) => (StatusCode::OK, Json(IntentResponse { intent })).into_response(),
        Err(error) => {
            let failure = DispatchFailure::Classification(error.source);
            let body = ErrorEnvelope { error: dispatch_error(&failure, &correlation_id) };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text(), &correlation_id),
    };
    if request.message.trim().is_empty() {
        return bad_request("`message` must not be empty".to_string(), &correlation_id);
    }

    let span = info_span!("http.chat", correlation_id = %correlation_id);
    let reply = state
        .runtime
        .handle_message(&request.message, request.history.as_deref().unwrap_or_default())
        .instrument(span)
        .await;

    info!(
        event_name = "http.chat.completed",
        correlation_id = %correlation_id,
        intent = %reply.intent,
        failed = reply.failure.is_some(),
        "chat request handled"
    );

    let error = reply.failure.as_ref().map(|failure| dispatch_error(failure, &correlation_id));
    let status =
        if error.is_some() { StatusCode::INTERNAL_SERVER_ERROR } else { StatusCode::OK };
    let body = ChatResponse { intent: reply.intent, response: reply.response, error };
    (status, Json(body)).into_response()
}
