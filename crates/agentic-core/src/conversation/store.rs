//! Conversation state storage backends
//!
//! The at-most-one-active-conversation rule is enforced here, through
//! [`ConversationStore::create_if_absent`], so that in-memory and Redis
//! deployments behave the same. Turns on one conversation are serialized
//! through a short lease ([`ConversationStore::claim_turn`]) so two requests
//! can never both advance the same step.
//!
//! # Production Safety
//!
//! When `AGENTIC_ENV=production`, `MemoryConversationStore::try_new()`
//! returns an error: a process-local store breaks the invariant as soon as
//! more than one instance serves traffic. Set
//! `AGENTIC_ALLOW_MEMORY_STORE_IN_PRODUCTION=1` to run a single instance
//! anyway.

use super::state::{state_key, ConversationKind, ConversationState};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Default lifetime of an idle conversation
pub const DEFAULT_CONVERSATION_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on how long a turn lease outlives a crashed holder
pub const TURN_LEASE_TTL: Duration = Duration::from_secs(180);

fn is_production() -> bool {
    std::env::var("AGENTIC_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false)
}

fn is_production_bypass_enabled() -> bool {
    std::env::var("AGENTIC_ALLOW_MEMORY_STORE_IN_PRODUCTION")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Per-user conversation storage
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Get the user's conversation of `kind`
    async fn get(&self, user_id: &str, kind: ConversationKind) -> Result<Option<ConversationState>>;

    /// Insert or replace a conversation
    async fn put(&self, state: &ConversationState) -> Result<()>;

    /// Remove a conversation; `true` when one existed
    async fn delete(&self, user_id: &str, kind: ConversationKind) -> Result<bool>;

    /// Insert only when no conversation of the same kind exists
    ///
    /// Returns `false`, leaving the stored state untouched, when one does.
    async fn create_if_absent(&self, state: &ConversationState) -> Result<bool>;

    /// The user's most recently updated active conversation of any kind
    async fn find_active(&self, user_id: &str) -> Result<Option<ConversationState>>;

    /// Take the turn lease for one conversation
    ///
    /// Returns `false` while another request holds it. The holder must call
    /// [`release_turn`](Self::release_turn) when the turn ends.
    async fn claim_turn(&self, user_id: &str, kind: ConversationKind) -> Result<bool>;

    /// Give the turn lease back
    async fn release_turn(&self, user_id: &str, kind: ConversationKind) -> Result<()>;
}

fn most_recent(states: impl IntoIterator<Item = ConversationState>) -> Option<ConversationState> {
    states
        .into_iter()
        .filter(ConversationState::is_active)
        .max_by_key(|state| state.updated_at)
}

/// In-memory store (tests, single instance)
///
/// Entries idle for longer than the TTL are treated as absent and dropped
/// on the next write or [`cleanup_expired`](Self::cleanup_expired).
pub struct MemoryConversationStore {
    states: Arc<RwLock<HashMap<String, ConversationState>>>,
    turns: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl MemoryConversationStore {
    /// Create a memory store
    ///
    /// # Errors
    ///
    /// Returns error if `AGENTIC_ENV=production` unless bypass is enabled.
    pub fn try_new() -> Result<Self> {
        if is_production() && !is_production_bypass_enabled() {
            error!(
                "SECURITY BLOCK: MemoryConversationStore is not allowed in production. \
                 Use the redis backend, or set AGENTIC_ALLOW_MEMORY_STORE_IN_PRODUCTION=1"
            );
            return Err(Error::Configuration(
                "memory conversation store is not allowed in production".to_string(),
            ));
        }

        if is_production() {
            warn!("MemoryConversationStore in production: conversations are lost on restart");
        }

        info!("Initializing MemoryConversationStore");
        Ok(Self::new_unsafe())
    }

    /// Create a memory store, skipping the production check
    #[must_use]
    pub fn new_unsafe() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
            turns: Mutex::new(HashMap::new()),
            ttl: DEFAULT_CONVERSATION_TTL,
        }
    }

    /// Set the idle TTL
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn is_expired(&self, state: &ConversationState) -> bool {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        Utc::now() - state.updated_at > ttl
    }

    /// Drop expired conversations, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, state| !self.is_expired(state));
        let removed = before - states.len();
        if removed > 0 {
            debug!(removed, remaining = states.len(), "Cleaned up expired conversations");
        }
        removed
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get(&self, user_id: &str, kind: ConversationKind) -> Result<Option<ConversationState>> {
        let states = self.states.read().await;
        Ok(states
            .get(&state_key(user_id, kind))
            .filter(|state| !self.is_expired(state))
            .cloned())
    }

    async fn put(&self, state: &ConversationState) -> Result<()> {
        let mut states = self.states.write().await;
        states.insert(state.key(), state.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str, kind: ConversationKind) -> Result<bool> {
        let mut states = self.states.write().await;
        Ok(states.remove(&state_key(user_id, kind)).is_some())
    }

    async fn create_if_absent(&self, state: &ConversationState) -> Result<bool> {
        let key = state.key();
        let mut states = self.states.write().await;
        if let Some(existing) = states.get(&key) {
            if !self.is_expired(existing) {
                return Ok(false);
            }
            debug!(key = %key, "Replacing expired conversation");
        }
        states.insert(key, state.clone());
        Ok(true)
    }

    async fn find_active(&self, user_id: &str) -> Result<Option<ConversationState>> {
        let states = self.states.read().await;
        Ok(most_recent(
            ConversationKind::ALL
                .into_iter()
                .filter_map(|kind| states.get(&state_key(user_id, kind)))
                .filter(|state| !self.is_expired(state))
                .cloned(),
        ))
    }

    async fn claim_turn(&self, user_id: &str, kind: ConversationKind) -> Result<bool> {
        let mut turns = self.turns.lock().await;
        let now = Instant::now();
        match turns.get(&state_key(user_id, kind)) {
            Some(taken) if now.duration_since(*taken) < TURN_LEASE_TTL => Ok(false),
            _ => {
                turns.insert(state_key(user_id, kind), now);
                Ok(true)
            }
        }
    }

    async fn release_turn(&self, user_id: &str, kind: ConversationKind) -> Result<()> {
        self.turns.lock().await.remove(&state_key(user_id, kind));
        Ok(())
    }
}

/// Redis-backed store (multi-instance deployments)
///
/// Keys are `{prefix}{user_id}:{kind}` and every write refreshes the TTL.
pub struct RedisConversationStore {
    client: redis::Client,
    prefix: String,
    ttl_seconds: u64,
}

impl RedisConversationStore {
    /// Create a Redis store
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        Self::with_options(
            redis_url,
            "agentic:conversation:",
            DEFAULT_CONVERSATION_TTL.as_secs(),
        )
    }

    /// Create with custom prefix and TTL
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn with_options(redis_url: &str, prefix: &str, ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::Internal(e.to_string()))?;
        Ok(Self {
            client,
            prefix: prefix.to_string(),
            ttl_seconds: ttl_seconds.max(1),
        })
    }

    fn build_key(&self, user_id: &str, kind: ConversationKind) -> String {
        format!("{}{}", self.prefix, state_key(user_id, kind))
    }

    fn turn_key(&self, user_id: &str, kind: ConversationKind) -> String {
        format!("{}turn:{}", self.prefix, state_key(user_id, kind))
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Internal(format!("Redis connection failed: {e}")))
    }

    fn decode(json: &str) -> Result<ConversationState> {
        serde_json::from_str(json)
            .map_err(|e| Error::Internal(format!("Failed to deserialize conversation: {e}")))
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn get(&self, user_id: &str, kind: ConversationKind) -> Result<Option<ConversationState>> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = redis::cmd("GET")
            .arg(self.build_key(user_id, kind))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis GET failed: {e}")))?;

        data.as_deref().map(Self::decode).transpose()
    }

    async fn put(&self, state: &ConversationState) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(state)?;

        redis::cmd("SETEX")
            .arg(self.build_key(&state.user_id, state.kind))
            .arg(self.ttl_seconds)
            .arg(&json)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis SETEX failed: {e}")))?;

        debug!(key = %state.key(), step = %state.step, "Conversation saved to Redis");
        Ok(())
    }

    async fn delete(&self, user_id: &str, kind: ConversationKind) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let deleted: i64 = redis::cmd("DEL")
            .arg(self.build_key(user_id, kind))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis DEL failed: {e}")))?;

        Ok(deleted > 0)
    }

    async fn create_if_absent(&self, state: &ConversationState) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(state)?;

        let reply: Option<String> = redis::cmd("SET")
            .arg(self.build_key(&state.user_id, state.kind))
            .arg(&json)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis SET NX failed: {e}")))?;

        Ok(reply.is_some())
    }

    async fn find_active(&self, user_id: &str) -> Result<Option<ConversationState>> {
        let mut conn = self.get_connection().await?;
        let keys: Vec<String> = ConversationKind::ALL
            .into_iter()
            .map(|kind| self.build_key(user_id, kind))
            .collect();

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis MGET failed: {e}")))?;

        let states = values
            .iter()
            .flatten()
            .map(|json| Self::decode(json))
            .collect::<Result<Vec<_>>>()?;
        Ok(most_recent(states))
    }

    async fn claim_turn(&self, user_id: &str, kind: ConversationKind) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.turn_key(user_id, kind))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(TURN_LEASE_TTL.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis SET NX failed: {e}")))?;

        Ok(reply.is_some())
    }

    async fn release_turn(&self, user_id: &str, kind: ConversationKind) -> Result<()> {
        let mut conn = self.get_connection().await?;
        redis::cmd("DEL")
            .arg(self.turn_key(user_id, kind))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Internal(format!("Redis DEL failed: {e}")))?;
        Ok(())
    }
}
