//! HTTP surface
//!
//! - `POST /agentic`: the orchestrator entry point
//! - `/resume/*`: standalone résumé conversation
//! - `/health`, `/health/detailed`
//! - `/docs`: Swagger UI

pub mod agentic;
pub mod docs;
pub mod error;
pub mod health;
pub mod resume;

use agentic_core::{Orchestrator, ResumeConversationService, ShutdownController};
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use agentic::agentic_routes;
pub use docs::docs_routes;
pub use error::{ApiError, ErrorBody};
pub use health::health_routes;
pub use resume::resume_routes;

/// Shared state handed to the routes
#[derive(Clone)]
pub struct AppServices {
    pub orchestrator: Arc<Orchestrator>,
    pub resume: ResumeConversationService,
    pub shutdown: Arc<ShutdownController>,
}

/// Build the application router with every endpoint and layer
pub fn app_router(services: AppServices) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(docs_routes())
        .merge(agentic_routes())
        .merge(resume_routes())
        .layer(Extension(services.orchestrator))
        .layer(Extension(services.resume))
        .layer(Extension(services.shutdown))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
