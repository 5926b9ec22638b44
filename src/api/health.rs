//! Health check endpoints with component-level diagnostics.
//!
//! - `/health`: status and version (for load balancers)
//! - `/health/detailed`: conversation store, LLM provider, agents, shutdown phase

use agentic_core::{Orchestrator, ShutdownController};
use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

/// Simple health response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Detailed health response with per-component checks
#[derive(Debug, Serialize, ToSchema)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// All component health checks
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub conversation_store: ComponentHealth,
    pub llm: ComponentHealth,
    pub agents: ComponentHealth,
    pub shutdown: ComponentHealth,
}

/// Individual component health status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: None,
        }
    }

    fn healthy_with_details(latency_ms: u64, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::healthy(latency_ms)
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: None,
        }
    }
}

/// Simple health check (for load balancers)
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Detailed health check with all component statuses
#[utoipa::path(
    get,
    path = "/health/detailed",
    tag = "health",
    responses((status = 200, description = "Per-component status", body = DetailedHealthResponse))
)]
pub async fn detailed_health_check(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Extension(shutdown): Extension<Arc<ShutdownController>>,
) -> Json<DetailedHealthResponse> {
    let store_health = check_store(&orchestrator).await;
    let llm_health = ComponentHealth::healthy_with_details(
        0,
        serde_json::json!({ "provider": orchestrator.provider_name() }),
    );
    let agents_health = check_agents(&orchestrator);
    let shutdown_health = check_shutdown(&shutdown);

    let components = [
        store_health.status,
        llm_health.status,
        agents_health.status,
        shutdown_health.status,
    ];
    Json(DetailedHealthResponse {
        status: overall_status(&components),
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            conversation_store: store_health,
            llm: llm_health,
            agents: agents_health,
            shutdown: shutdown_health,
        },
    })
}

fn overall_status(components: &[&str]) -> &'static str {
    let healthy = components.iter().filter(|s| **s == "healthy").count();
    let unhealthy = components.iter().filter(|s| **s == "unhealthy").count();
    if unhealthy == 0 {
        "healthy"
    } else if healthy > 0 {
        "degraded"
    } else {
        "unhealthy"
    }
}

/// Round-trip a lookup for a user id that never exists
async fn check_store(orchestrator: &Orchestrator) -> ComponentHealth {
    let start = Instant::now();
    match orchestrator.store().find_active("__health__").await {
        Ok(_) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    }
}

fn check_agents(orchestrator: &Orchestrator) -> ComponentHealth {
    let agents: Vec<&str> = orchestrator
        .registry()
        .agent_types()
        .into_iter()
        .map(|agent| agent.as_str())
        .collect();
    if agents.is_empty() {
        return ComponentHealth::unhealthy("no agents registered".to_string());
    }
    ComponentHealth::healthy_with_details(0, serde_json::json!({ "registered": agents }))
}

fn check_shutdown(shutdown: &ShutdownController) -> ComponentHealth {
    let details = serde_json::json!({
        "phase": shutdown.phase().to_string(),
        "active_requests": shutdown.active_task_count(),
    });
    if shutdown.is_accepting_work() {
        ComponentHealth::healthy_with_details(0, details)
    } else {
        ComponentHealth {
            status: "unhealthy",
            latency_ms: None,
            error: Some("shutting down".to_string()),
            details: Some(details),
        }
    }
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}
