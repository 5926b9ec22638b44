//! Response assembly and token validation

use crate::error::{Error, Result};
use crate::types::{AgentResponse, AgentType, AgenticResponse, TranslationResult, DEFAULT_STATE, ERROR_STATE};
use agentic_tools::normalize_bearer;
use serde_json::{Map, Value};

/// How the agent was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouteSource {
    /// Classifier output
    Classified,
    /// The user's active conversation
    Continuation,
}

impl RouteSource {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Classified => "classifier",
            Self::Continuation => "continuation",
        }
    }
}

/// Normalize the `Authorization` value and reject malformed tokens
///
/// Empty tokens and tokens containing whitespace or control characters are
/// refused; the token itself never appears in the error.
///
/// # Examples
/// ```
/// use agentic_core::orchestrator::validate_token;
/// assert_eq!(validate_token("Bearer abc.def").unwrap(), "abc.def");
/// assert!(validate_token("Bearer ").is_err());
/// assert!(validate_token("two words").is_err());
/// ```
pub fn validate_token(raw: &str) -> Result<String> {
    let token = normalize_bearer(raw);
    if token.is_empty() {
        return Err(Error::InvalidToken("empty token".to_string()));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidToken(
            "token contains whitespace or control characters".to_string(),
        ));
    }
    Ok(token)
}

/// Everything the envelope reports about one successful request
pub(crate) struct Assembled<'a> {
    pub query: &'a str,
    pub uid: &'a str,
    pub translation: &'a TranslationResult,
    pub agent_type: AgentType,
    pub source: RouteSource,
    pub domain_type: Option<&'a str>,
    pub translated: bool,
}

impl Assembled<'_> {
    /// Merge handler output into the fixed envelope; envelope keys win
    pub(crate) fn finish(self, response: AgentResponse) -> AgenticResponse {
        let state = response
            .state
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STATE.to_string());

        let mut metadata: Map<String, Value> = response.metadata;
        let fixed = [
            ("query", Value::from(self.query)),
            ("english_query", Value::from(self.translation.translated_query.as_str())),
            ("source_lang", Value::from(self.translation.lang_code.as_str())),
            ("agentic_type", Value::from(self.agent_type.as_str())),
            ("uid", Value::from(self.uid)),
            ("state", Value::from(state.as_str())),
            ("is_english", Value::from(self.translation.is_english)),
            ("translated", Value::from(self.translated)),
            ("classification", Value::from(self.source.as_str())),
        ];
        for (key, value) in fixed {
            metadata.insert(key.to_string(), value);
        }
        if let Some(domain) = self.domain_type {
            metadata.insert("domain_type".to_string(), Value::from(domain));
        }

        AgenticResponse {
            response: response.response,
            metadata: Value::Object(metadata),
            state: Some(state),
            url: response.url,
        }
    }
}

/// The envelope for a request that could not be completed
pub(crate) fn error_envelope(
    apology: &str,
    query: &str,
    uid: &str,
    message: &str,
    kind: &str,
) -> AgenticResponse {
    let mut metadata = Map::new();
    metadata.insert("query".to_string(), Value::from(query));
    metadata.insert("uid".to_string(), Value::from(uid));
    metadata.insert("state".to_string(), Value::from(ERROR_STATE));
    metadata.insert("error".to_string(), Value::from(message));
    metadata.insert("error_kind".to_string(), Value::from(kind));

    AgenticResponse {
        response: apology.to_string(),
        metadata: Value::Object(metadata),
        state: Some(ERROR_STATE.to_string()),
        url: None,
    }
}
