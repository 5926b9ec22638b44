//! Request and response types shared across the pipeline

use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Default output state when a handler does not declare one
pub const DEFAULT_STATE: &str = "general";

/// State reported on every failure envelope
pub const ERROR_STATE: &str = "error";

/// Longest classifier answer still scanned word by word for a label
pub const MAX_LABEL_WORDS: usize = 3;

/// The closed set of agents a query can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Open-domain conversation
    General,
    /// Calendar add / delete / edit / check
    Calendar,
    /// Four-step résumé builder
    Resume,
    /// Job postings lookup
    JobSearch,
    /// Four-step cover-letter builder
    CoverLetter,
    /// Two-step community post
    Post,
    /// Place lookup
    Location,
    /// Current weather
    Weather,
    /// Events and festivals
    Event,
    /// Random dog picture
    Dog,
    /// Random cat picture and fact
    Cat,
    /// Guide to the service itself
    Eum,
}

impl AgentType {
    /// Every variant, in declaration order
    pub const ALL: [AgentType; 12] = [
        Self::General,
        Self::Calendar,
        Self::Resume,
        Self::JobSearch,
        Self::CoverLetter,
        Self::Post,
        Self::Location,
        Self::Weather,
        Self::Event,
        Self::Dog,
        Self::Cat,
        Self::Eum,
    ];

    /// Canonical label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Calendar => "calendar",
            Self::Resume => "resume",
            Self::JobSearch => "job_search",
            Self::CoverLetter => "cover_letter",
            Self::Post => "post",
            Self::Location => "location",
            Self::Weather => "weather",
            Self::Event => "event",
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Eum => "eum",
        }
    }

    /// Agents that keep state across turns
    #[must_use]
    pub fn is_conversational(&self) -> bool {
        matches!(self, Self::Resume | Self::CoverLetter | Self::Post)
    }

    /// Map a noisy model label to a variant.
    ///
    /// Quotes, casing, surrounding punctuation and common aliases are
    /// tolerated, as is a `prefix: label` answer. A short answer of at most
    /// [`MAX_LABEL_WORDS`] words may carry the label as one of its words;
    /// longer prose never does. Anything else is `General`.
    ///
    /// # Examples
    /// ```
    /// use agentic_core::AgentType;
    /// assert_eq!(AgentType::from_label("\"Cover Letter\"."), AgentType::CoverLetter);
    /// assert_eq!(AgentType::from_label("banana"), AgentType::General);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let line = label.trim().lines().next().unwrap_or_default();
        let answer = match line.rsplit_once(':') {
            Some((_, tail)) if !tail.trim().is_empty() => tail,
            _ => line,
        };
        let cleaned = normalize_label(answer);

        if let Some(agent) = Self::from_alias(&cleaned) {
            return agent;
        }

        let words: Vec<&str> = cleaned.split('_').filter(|w| !w.is_empty()).collect();
        if words.len() > MAX_LABEL_WORDS {
            debug!(label = %line, "Classifier answered with prose, using general");
            return Self::General;
        }
        for pair in words.windows(2) {
            if let Some(agent) = Self::from_alias(&pair.join("_")) {
                return agent;
            }
        }
        for word in &words {
            if let Some(agent) = Self::from_alias(word) {
                return agent;
            }
        }

        if words.iter().any(|w| matches!(*w, "task" | "domain")) {
            warn!(label = %line, "Classifier returned a non-canonical label, using general");
        }
        Self::General
    }

    fn from_alias(label: &str) -> Option<Self> {
        Some(match label {
            "general" => Self::General,
            "calendar" | "schedule" => Self::Calendar,
            "resume" | "cv" => Self::Resume,
            "job_search" | "jobsearch" | "job" | "jobs" => Self::JobSearch,
            "cover_letter" | "coverletter" => Self::CoverLetter,
            "post" | "community" => Self::Post,
            "location" | "place" | "places" => Self::Location,
            "weather" => Self::Weather,
            "event" | "events" | "festival" => Self::Event,
            "dog" | "puppy" => Self::Dog,
            "cat" | "kitten" => Self::Cat,
            "eum" => Self::Eum,
            _ => return None,
        })
    }
}

/// Lowercase, strip accents off "résumé", collapse separators to `_`
fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        let c = match c {
            'é' | 'É' => 'e',
            c => c.to_ascii_lowercase(),
        };
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if matches!(c, ' ' | '_' | '-' | '\t') && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = Error;

    /// Strict: canonical labels only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|agent| agent.as_str() == s)
            .ok_or_else(|| Error::Parse(format!("unknown agent type: {s}")))
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Selected agent
    pub agent_type: AgentType,
    /// Optional finer-grained domain the model reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<String>,
}

impl ClassificationResult {
    /// Classification without a domain
    #[must_use]
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            domain_type: None,
        }
    }
}

/// Translation stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// English working query
    pub translated_query: String,
    /// Two-letter source language code
    pub lang_code: String,
    /// Source language is English
    pub is_english: bool,
}

/// Everything a handler gets for one query
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRequest {
    /// Query as the user wrote it
    pub query: String,
    /// English working query
    pub english_query: String,
    /// User id
    pub uid: String,
    /// Normalized bearer token
    pub token: String,
    /// Caller-supplied state
    pub state: String,
    /// Source language code
    pub lang_code: String,
}

/// What a handler returns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentResponse {
    /// Natural-language answer
    pub response: String,
    /// Next state; `None` means the default
    pub state: Option<String>,
    /// Handler-specific metadata
    pub metadata: Map<String, Value>,
    /// Download or image link
    pub url: Option<String>,
}

impl AgentResponse {
    /// Plain text answer with no state change
    #[must_use]
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    /// Handler-level failure with `state="error"`
    #[must_use]
    pub fn error(response: impl Into<String>) -> Self {
        Self::text(response).with_state(ERROR_STATE)
    }

    /// Set the next state
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a link
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Whether the handler reported a failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.state.as_deref() == Some(ERROR_STATE)
    }
}

/// The envelope returned from `/agentic`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticResponse {
    /// Natural-language answer
    pub response: String,
    /// Fixed envelope fields plus handler metadata
    pub metadata: Value,
    /// Next state for the caller to send back
    pub state: Option<String>,
    /// Download or image link
    pub url: Option<String>,
}
