//! Server configuration types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorAppConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub storage: StorageAppConfig,
    #[serde(default)]
    pub renderer: RendererAppConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// LLM configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub lightweight_model: String,
    pub high_performance_model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: agentic_llm::openai::DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            lightweight_model: "gpt-4o-mini".to_string(),
            high_performance_model: "gpt-4o".to_string(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

// SECURITY: never print the key
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &agentic_llm::util::mask_api_key(&self.api_key))
            .field("lightweight_model", &self.lightweight_model)
            .field("high_performance_model", &self.high_performance_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_llm_timeout() -> u64 {
    60
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Where conversation state lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationBackend {
    #[default]
    Memory,
    Redis,
}

/// Conversation store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default)]
    pub backend: ConversationBackend,
    /// Idle time before a conversation is dropped
    #[serde(default = "default_conversation_ttl")]
    pub ttl_secs: u64,
    /// Redis key prefix
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Memory store sweep interval
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            backend: ConversationBackend::Memory,
            ttl_secs: default_conversation_ttl(),
            key_prefix: default_key_prefix(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_conversation_ttl() -> u64 {
    1800
}

fn default_key_prefix() -> String {
    "agentic:conversation:".to_string()
}

fn default_cleanup_interval() -> u64 {
    300
}

/// Orchestrator configuration (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorAppConfig {
    /// Maximum time for one `/agentic` request in seconds (0 = no limit)
    #[serde(default = "default_max_request_secs")]
    pub max_request_secs: u64,
    /// Send continuation steps straight to the active conversation
    #[serde(default = "default_true")]
    pub continuation_routing: bool,
    /// Override for the apology text
    #[serde(default)]
    pub apology: Option<String>,
}

impl Default for OrchestratorAppConfig {
    fn default() -> Self {
        Self {
            max_request_secs: default_max_request_secs(),
            continuation_routing: true,
            apology: None,
        }
    }
}

fn default_max_request_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

/// Collaborator endpoints and keys
#[derive(Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    pub calendar_base_url: String,
    pub community_api_url: String,
    pub profile_base_url: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub kakao_api_key: String,
    #[serde(default)]
    pub google_api_key: String,
    #[serde(default)]
    pub google_cx: String,
    pub weather_base_url: String,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            calendar_base_url: "http://127.0.0.1:8080".to_string(),
            community_api_url: "http://127.0.0.1:8080/posts".to_string(),
            profile_base_url: "http://127.0.0.1:8080".to_string(),
            http_timeout_secs: default_http_timeout(),
            kakao_api_key: String::new(),
            google_api_key: String::new(),
            google_cx: String::new(),
            weather_base_url: agentic_tools::weather::WTTR_BASE.to_string(),
        }
    }
}

impl fmt::Debug for IntegrationsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use agentic_llm::util::mask_api_key;
        f.debug_struct("IntegrationsConfig")
            .field("calendar_base_url", &self.calendar_base_url)
            .field("community_api_url", &self.community_api_url)
            .field("profile_base_url", &self.profile_base_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("kakao_api_key", &mask_api_key(&self.kakao_api_key))
            .field("google_api_key", &mask_api_key(&self.google_api_key))
            .field("google_cx", &self.google_cx)
            .field("weather_base_url", &self.weather_base_url)
            .finish()
    }
}

fn default_http_timeout() -> u64 {
    10
}

/// Artifact storage configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageAppConfig {
    pub endpoint: String,
    pub public_base_url: String,
    pub bucket: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// How long a generated document stays downloadable
    #[serde(default = "default_artifact_ttl")]
    pub artifact_ttl_secs: u64,
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000".to_string(),
            public_base_url: "http://127.0.0.1:9000/agentic".to_string(),
            bucket: "agentic".to_string(),
            access_token: None,
            artifact_ttl_secs: default_artifact_ttl(),
        }
    }
}

impl fmt::Debug for StorageAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAppConfig")
            .field("endpoint", &self.endpoint)
            .field("public_base_url", &self.public_base_url)
            .field("bucket", &self.bucket)
            .field("access_token", &self.access_token.as_ref().map(|_| "****"))
            .field("artifact_ttl_secs", &self.artifact_ttl_secs)
            .finish()
    }
}

fn default_artifact_ttl() -> u64 {
    600
}

/// PDF renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererAppConfig {
    pub command: String,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Defaults to a directory under the system temp dir
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,
}

impl Default for RendererAppConfig {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf".to_string(),
            args: None,
            output_dir: None,
            timeout_secs: default_render_timeout(),
        }
    }
}

fn default_render_timeout() -> u64 {
    60
}
