//! Server initialization and main run loop

use super::background_tasks::start_conversation_cleanup_task;
use super::config::{AppConfig, ConversationBackend, LlmConfig};
use super::loader::load_config;
use super::validation::validate_production_config;
use crate::api::{app_router, AppServices};
use agentic_core::shutdown::shutdown_signal_with_controller;
use agentic_core::{
    ArtifactJanitor, Collaborators, ConversationStore, MemoryConversationStore, Orchestrator,
    OrchestratorConfig, RedisConversationStore, ResumeConversationService, ShutdownController,
};
use agentic_llm::{GatewayConfig, LlmGateway, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use agentic_tools::{
    AnimalEndpoints, CommandPdfRenderer, GoogleSearch, HttpAnimalApi, HttpCalendarBackend,
    HttpClient, HttpConfig, HttpObjectStorage, HttpPostPublisher, HttpProfileService, KakaoSearch,
    PlaceSearch, RendererConfig, StorageConfig, WebSearch, WttrWeather,
};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Conversation store plus the memory store handle when one is in use
pub struct StoreHandles {
    pub store: Arc<dyn ConversationStore>,
    pub memory: Option<Arc<MemoryConversationStore>>,
}

/// Build the LLM gateway from configuration
pub fn build_llm(config: &LlmConfig) -> Result<LlmGateway> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let provider = OpenAiCompatibleProvider::new(
        OpenAiCompatibleConfig::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_model(config.lightweight_model.clone())
            .with_timeout(timeout),
    )
    .context("Failed to initialize LLM provider")?;

    Ok(LlmGateway::new(
        Arc::new(provider),
        GatewayConfig {
            lightweight_model: config.lightweight_model.clone(),
            high_performance_model: config.high_performance_model.clone(),
            timeout_secs: config.timeout_secs,
        },
    ))
}

/// Build the conversation store selected by `conversation.backend`
pub fn build_store(config: &AppConfig) -> Result<StoreHandles> {
    let ttl = Duration::from_secs(config.conversation.ttl_secs);
    match config.conversation.backend {
        ConversationBackend::Memory => {
            let memory = Arc::new(
                MemoryConversationStore::try_new()
                    .context("Failed to initialize memory conversation store")?
                    .with_ttl(ttl),
            );
            Ok(StoreHandles {
                store: memory.clone(),
                memory: Some(memory),
            })
        }
        ConversationBackend::Redis => {
            let redis = RedisConversationStore::with_options(
                &config.redis.url,
                &config.conversation.key_prefix,
                config.conversation.ttl_secs,
            )
            .context("Failed to initialize Redis conversation store")?;
            info!("Conversation state stored in Redis");
            Ok(StoreHandles {
                store: Arc::new(redis),
                memory: None,
            })
        }
    }
}

/// Build every collaborator client the handlers need
pub fn build_collaborators(
    config: &AppConfig,
    llm: LlmGateway,
    store: Arc<dyn ConversationStore>,
    shutdown: &ShutdownController,
) -> Result<Collaborators> {
    let integrations = &config.integrations;
    let http = HttpClient::new(HttpConfig {
        timeout: Duration::from_secs(integrations.http_timeout_secs.max(1)),
        ..HttpConfig::default()
    })
    .context("Failed to build HTTP client")?;

    let storage = Arc::new(
        HttpObjectStorage::new(
            http.clone(),
            StorageConfig {
                endpoint: config.storage.endpoint.clone(),
                bucket: config.storage.bucket.clone(),
                public_base_url: config.storage.public_base_url.clone(),
                access_token: config.storage.access_token.clone(),
            },
        )
        .context("Failed to initialize artifact storage")?,
    );

    let defaults = RendererConfig::default();
    let renderer = CommandPdfRenderer::new(RendererConfig {
        command: config.renderer.command.clone(),
        args: config.renderer.args.clone().unwrap_or(defaults.args),
        output_dir: config
            .renderer
            .output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir),
        timeout: Duration::from_secs(config.renderer.timeout_secs.max(1)),
    });

    let kakao = match KakaoSearch::new(http.clone(), integrations.kakao_api_key.clone()) {
        Ok(kakao) => Some(Arc::new(kakao)),
        Err(e) => {
            warn!(error = %e, "Kakao search not configured, location lookups disabled");
            None
        }
    };
    let web_search: Option<Arc<dyn WebSearch>> = match GoogleSearch::new(
        http.clone(),
        integrations.google_api_key.clone(),
        integrations.google_cx.clone(),
    ) {
        Ok(google) => Some(Arc::new(google)),
        Err(_) => kakao.clone().map(|k| k as Arc<dyn WebSearch>),
    };
    if web_search.is_none() {
        warn!("No web search configured, event and job lookups disabled");
    }
    let places: Option<Arc<dyn PlaceSearch>> = kakao.map(|k| k as Arc<dyn PlaceSearch>);

    let janitor = Arc::new(ArtifactJanitor::new(storage.clone(), shutdown.token()));

    Ok(Collaborators {
        llm,
        calendar: Arc::new(HttpCalendarBackend::new(
            http.clone(),
            integrations.calendar_base_url.clone(),
        )),
        storage,
        renderer: Arc::new(renderer),
        publisher: Arc::new(HttpPostPublisher::new(
            http.clone(),
            integrations.community_api_url.clone(),
        )),
        profile: Some(Arc::new(HttpProfileService::new(
            http.clone(),
            integrations.profile_base_url.clone(),
        ))),
        web_search,
        places,
        weather: Arc::new(WttrWeather::new(http.clone(), integrations.weather_base_url.clone())),
        animals: Arc::new(HttpAnimalApi::new(http, AnimalEndpoints::default())),
        store,
        janitor,
        artifact_ttl: Duration::from_secs(config.storage.artifact_ttl_secs),
    })
}

/// Orchestrator settings from the TOML section
pub fn orchestrator_config(config: &AppConfig) -> OrchestratorConfig {
    let section = &config.orchestrator;
    let base = OrchestratorConfig::new()
        .with_max_request_secs(section.max_request_secs)
        .with_continuation_routing(section.continuation_routing);
    match &section.apology {
        Some(apology) => base.with_apology(apology.clone()),
        None => base,
    }
}

/// Everything `run` starts, without binding a socket
pub fn build_services(
    config: &AppConfig,
    shutdown: &Arc<ShutdownController>,
) -> Result<(AppServices, Option<JoinHandle<()>>)> {
    let llm = build_llm(&config.llm)?;
    info!(provider = llm.provider_name(), "LLM gateway initialized");

    let stores = build_store(config)?;
    let cleanup = stores.memory.clone().map(|memory| {
        start_conversation_cleanup_task(
            memory,
            Duration::from_secs(config.conversation.cleanup_interval_secs.max(1)),
            shutdown,
        )
    });

    let collab = build_collaborators(config, llm, stores.store, shutdown)?;
    let orchestrator = Arc::new(Orchestrator::from_collaborators(
        &collab,
        orchestrator_config(config),
    ));
    let resume = ResumeConversationService::new(collab.resume_engine());

    Ok((
        AppServices {
            orchestrator,
            resume,
            shutdown: shutdown.clone(),
        },
        cleanup,
    ))
}

/// Run the server
pub async fn run() -> Result<()> {
    info!("Starting Agentic v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    validate_production_config(&config)?;

    let shutdown_controller =
        ShutdownController::with_timeout(Duration::from_secs(config.server.shutdown_timeout_secs));
    let (services, cleanup) = build_services(&config, &shutdown_controller)?;
    let app = app_router(services);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_with_controller(shutdown_controller.clone()))
        .await
        .context("HTTP server error")?;

    if let Some(handle) = cleanup {
        if let Err(e) = handle.await {
            warn!("Conversation cleanup task error: {}", e);
        }
    }

    info!("Agentic shutdown complete");
    Ok(())
}
