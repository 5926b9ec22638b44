//! Résumé conversation endpoints
//!
//! A standalone surface over the same conversation store as `/agentic`:
//! the server tracks the step, callers only send answers.

use super::error::{ApiError, ErrorBody};
use agentic_core::{ConversationState, ResumeConversationService, TurnView};
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// One conversation turn
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TurnReply {
    /// Step the conversation waits for, `first` once completed
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub is_completed: bool,
}

impl From<TurnView> for TurnReply {
    fn from(view: TurnView) -> Self {
        Self {
            state: view.state,
            question: view.question,
            download_url: view.download_url,
            is_completed: view.is_completed,
        }
    }
}

/// Body of `POST /resume/respond/{user_id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub answer: String,
}

/// Stored conversation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationView {
    pub user_id: String,
    pub kind: String,
    /// Next expected step
    pub step: String,
    #[schema(value_type = Object)]
    pub collected_fields: Value,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationState> for ConversationView {
    fn from(state: ConversationState) -> Self {
        Self {
            user_id: state.user_id,
            kind: state.kind.as_str().to_string(),
            step: state.step.as_str().to_string(),
            collected_fields: Value::Object(state.collected_fields),
            is_completed: state.is_completed,
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

/// Start a résumé conversation
#[utoipa::path(
    post,
    path = "/resume/start/{user_id}",
    tag = "resume",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "First question", body = TurnReply),
        (status = 409, description = "A conversation is already in progress", body = ErrorBody)
    )
)]
pub async fn start(
    Extension(service): Extension<ResumeConversationService>,
    Path(user_id): Path<String>,
) -> Result<Json<TurnReply>, ApiError> {
    let view = service.start(&user_id).await?;
    Ok(Json(view.into()))
}

/// Answer the pending question
#[utoipa::path(
    post,
    path = "/resume/respond/{user_id}",
    tag = "resume",
    params(("user_id" = String, Path, description = "User id")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Next question or the finished document", body = TurnReply),
        (status = 400, description = "Conversation cannot take an answer", body = ErrorBody),
        (status = 404, description = "No conversation in progress", body = ErrorBody),
        (status = 502, description = "Model or storage failure", body = ErrorBody)
    )
)]
pub async fn respond(
    Extension(service): Extension<ResumeConversationService>,
    Path(user_id): Path<String>,
    Json(body): Json<AnswerRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    let view = service.respond(&user_id, &body.answer).await?;
    Ok(Json(view.into()))
}

/// Current conversation state
#[utoipa::path(
    get,
    path = "/resume/status/{user_id}",
    tag = "resume",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Conversation state", body = ConversationView),
        (status = 404, description = "No conversation in progress", body = ErrorBody)
    )
)]
pub async fn status(
    Extension(service): Extension<ResumeConversationService>,
    Path(user_id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let state = service.status(&user_id).await?;
    Ok(Json(state.into()))
}

/// Create the résumé routes
pub fn resume_routes() -> Router {
    Router::new()
        .route("/resume/start/:user_id", post(start))
        .route("/resume/respond/:user_id", post(respond))
        .route("/resume/status/:user_id", get(status))
}
