//! `POST /agentic`

use super::error::{ApiError, ErrorBody};
use agentic_core::{AgenticResponse, Orchestrator, ShutdownController};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

/// Body of `POST /agentic`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgenticRequest {
    /// User text in any language
    pub query: String,
    /// User id
    pub uid: String,
    /// State returned by the previous turn; empty for a fresh request
    #[serde(default)]
    pub state: String,
}

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgenticReply {
    /// Natural-language answer in the user's language
    pub response: String,
    /// Envelope fields (`agentic_type`, `source_lang`, ...) plus handler data
    #[schema(value_type = Object)]
    pub metadata: Value,
    /// State to send with the next request
    pub state: Option<String>,
    /// Download or image link
    pub url: Option<String>,
}

impl From<AgenticResponse> for AgenticReply {
    fn from(response: AgenticResponse) -> Self {
        Self {
            response: response.response,
            metadata: response.metadata,
            state: response.state,
            url: response.url,
        }
    }
}

/// Route a query to the matching agent
///
/// The `Authorization` header may carry the raw token or `Bearer <token>`.
#[utoipa::path(
    post,
    path = "/agentic",
    tag = "agentic",
    request_body = AgenticRequest,
    params(
        ("Authorization" = String, Header, description = "User token, raw or `Bearer <token>`")
    ),
    responses(
        (status = 200, description = "Answer envelope; failures carry state \"error\"", body = AgenticReply),
        (status = 500, description = "The request task itself failed", body = ErrorBody),
        (status = 503, description = "Server is shutting down", body = ErrorBody)
    )
)]
pub async fn agentic(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Extension(shutdown): Extension<Arc<ShutdownController>>,
    headers: HeaderMap,
    Json(request): Json<AgenticRequest>,
) -> Response {
    if !shutdown.is_accepting_work() {
        return ApiError::unavailable().into_response();
    }
    let guard = shutdown.register_task();

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let task = tokio::spawn(async move {
        let response = orchestrator
            .get_response(&request.query, &request.uid, &token, &request.state)
            .await;
        drop(guard);
        response
    });

    match task.await {
        Ok(response) => Json(AgenticReply::from(response)).into_response(),
        Err(e) => {
            error!(error = %e, "Agentic request task failed");
            ApiError::internal("The request could not be completed.").into_response()
        }
    }
}

/// Create the `/agentic` route
pub fn agentic_routes() -> Router {
    Router::new().route("/agentic", post(agentic))
}
