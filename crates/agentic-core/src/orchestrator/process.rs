//! Orchestrator request pipeline

use crate::conversation::ConversationStep;
use crate::error::{Error, Result};
use crate::types::{AgentRequest, AgentType, AgenticResponse, ClassificationResult};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::core::Orchestrator;
use super::envelope::{error_envelope, validate_token, Assembled, RouteSource};

impl Orchestrator {
    /// Answer one `/agentic` request
    ///
    /// Never fails: errors, panics and timeouts all produce the apology
    /// envelope with `state="error"`.
    #[instrument(skip_all, fields(uid = %uid, state = %state))]
    pub async fn get_response(
        &self,
        query: &str,
        uid: &str,
        token: &str,
        state: &str,
    ) -> AgenticResponse {
        let start = Instant::now();
        let pipeline = AssertUnwindSafe(self.run(query, uid, token, state)).catch_unwind();

        let outcome = if self.config.max_request_secs > 0 {
            let limit = Duration::from_secs(self.config.max_request_secs);
            match tokio::time::timeout(limit, pipeline).await {
                Ok(outcome) => outcome,
                Err(_) => Ok(Err(Error::Internal(format!(
                    "request exceeded {}s",
                    self.config.max_request_secs
                )))),
            }
        } else {
            pipeline.await
        };

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(error = %e, kind = e.kind().as_str(), "Request failed");
                error_envelope(&self.config.apology, query, uid, &e.to_string(), e.kind().as_str())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, "Request handler panicked");
                error_envelope(&self.config.apology, query, uid, &message, "internal")
            }
        };

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            state = response.state.as_deref().unwrap_or_default(),
            "Request completed"
        );
        response
    }

    async fn run(&self, query: &str, uid: &str, token: &str, state: &str) -> Result<AgenticResponse> {
        let token = validate_token(token)?;

        let translation = self.translator.translate(query).await;
        debug!(lang = %translation.lang_code, "Query translated");

        let (classification, source) = self.route(uid, state, &translation.translated_query).await;
        let agent_type = classification.agent_type;
        info!(agent = %agent_type, source = source.as_str(), "Dispatching");

        let request = AgentRequest {
            query: query.to_string(),
            english_query: translation.translated_query.clone(),
            uid: uid.to_string(),
            token,
            state: state.to_string(),
            lang_code: translation.lang_code.clone(),
        };
        let mut response = self.registry.dispatch(agent_type, &request).await?;

        let mut translated = false;
        if !translation.is_english {
            match self
                .translator
                .translate_back(&response.response, &translation.lang_code)
                .await
            {
                Ok(text) => {
                    response.response = text;
                    translated = true;
                }
                Err(e) => warn!(error = %e, "Translating the answer back failed, returning it untranslated"),
            }
        }

        Ok(Assembled {
            query,
            uid,
            translation: &translation,
            agent_type,
            source,
            domain_type: classification.domain_type.as_deref(),
            translated,
        }
        .finish(response))
    }

    /// Continuation steps go to the user's active conversation; everything
    /// else is classified
    async fn route(
        &self,
        uid: &str,
        state: &str,
        english_query: &str,
    ) -> (ClassificationResult, RouteSource) {
        if self.config.continuation_routing {
            if let Some(agent_type) = self.active_conversation(uid, state).await {
                return (ClassificationResult::new(agent_type), RouteSource::Continuation);
            }
        }
        (
            self.classifier.classify(english_query).await,
            RouteSource::Classified,
        )
    }

    async fn active_conversation(&self, uid: &str, state: &str) -> Option<AgentType> {
        let step = ConversationStep::parse(state).ok()?;
        if !step.is_continuation() {
            return None;
        }
        match self.store.find_active(uid).await {
            Ok(found) => found.map(|conversation| conversation.kind.agent_type()),
            Err(e) => {
                warn!(error = %e, "Conversation lookup failed, classifying instead");
                None
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
