//! API Documentation - Swagger UI
//!
//! Provides OpenAPI documentation at /docs

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{
    agentic::{AgenticReply, AgenticRequest},
    error::ErrorBody,
    health::{ComponentHealth, DetailedHealthResponse, HealthChecks, HealthResponse},
    resume::{AnswerRequest, ConversationView, TurnReply},
};

/// Agentic API OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agentic API",
        version = "1.0.0",
        description = "Query-routing assistant backend.

## Overview
- **Agentic**: one endpoint that translates, classifies and answers any query
- **Resume**: step-by-step résumé conversation
- **Health**: liveness and component checks

## State
Multi-turn features answer with a `state` value (`second`, `third`, ...).
Send it back with the next request to continue the conversation.
"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        crate::api::agentic::agentic,
        crate::api::resume::start,
        crate::api::resume::respond,
        crate::api::resume::status,
        crate::api::health::health_check,
        crate::api::health::detailed_health_check,
    ),
    components(
        schemas(
            AgenticRequest,
            AgenticReply,
            ErrorBody,
            TurnReply,
            AnswerRequest,
            ConversationView,
            HealthResponse,
            DetailedHealthResponse,
            HealthChecks,
            ComponentHealth,
        )
    ),
    tags(
        (name = "agentic", description = "Query routing"),
        (name = "resume", description = "Résumé conversation"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Create documentation routes
pub fn docs_routes() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()))
}
