//! Agent classifier
//!
//! One lightweight-tier call with a few-shot prompt over the closed
//! [`AgentType`] label set. Whatever the model says, the result is a member
//! of that set.

use crate::types::{AgentType, ClassificationResult};
use agentic_llm::json::decode_object;
use agentic_llm::{LlmGateway, TaskType};
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub(crate) const CLASSIFY_INSTRUCTION: &str =
    "Classify the user request into exactly one agent type.";

const CLASSIFY_EXAMPLES: &str = r#"Agent types:
- calendar: add, delete, edit or check schedule entries
- resume: write a résumé
- cover_letter: write a cover letter
- post: write a community post
- job_search: find job postings
- location: find a place, restaurant, hospital, office
- weather: current weather
- event: festivals, concerts, local events
- dog: show a dog picture
- cat: show a cat picture or fact
- eum: questions about how to use the Eum service
- general: anything else

Examples:
Request: I have a meeting at 9am tomorrow -> calendar
Request: What is on my schedule this week? -> calendar
Request: Cancel my dentist appointment -> calendar
Request: Please write a post about good restaurants in Busan -> post
Request: I want to share tips about getting a visa -> post
Request: Help me make my resume -> resume
Request: Write a cover letter for a marketing job -> cover_letter
Request: Find part-time jobs near Seoul station -> job_search
Request: Where is the nearest immigration office? -> location
Request: Is it going to rain today? -> weather
Request: Any festivals this weekend? -> event
Request: Show me a cute dog -> dog
Request: Tell me something about cats -> cat
Request: How do I change my language setting in Eum? -> eum
Request: How do I open a bank account in Korea? -> general
Request: Hello! -> general"#;

/// LLM-backed classifier
#[derive(Clone)]
pub struct Classifier {
    llm: LlmGateway,
}

impl Classifier {
    /// Create a classifier
    #[must_use]
    pub fn new(llm: LlmGateway) -> Self {
        Self { llm }
    }

    /// Pick the agent for an English query; failures yield `General`
    #[instrument(skip(self, english_query))]
    pub async fn classify(&self, english_query: &str) -> ClassificationResult {
        let prompt = format!(
            "{CLASSIFY_INSTRUCTION} Answer with the label only.\n\n{CLASSIFY_EXAMPLES}\n\nRequest: {english_query} ->"
        );

        match self.llm.generate_for(TaskType::Classification, &prompt).await {
            Ok(output) => {
                let result = parse_classification(&output);
                debug!(agent = %result.agent_type, "Classified query");
                result
            }
            Err(e) => {
                warn!(error = %e, "Classification failed, routing to general");
                ClassificationResult::new(AgentType::General)
            }
        }
    }
}

/// Accepts a bare label or an object with `agent_type` / `type`
pub(crate) fn parse_classification(output: &str) -> ClassificationResult {
    if let Some(map) = decode_object(output) {
        let label = map
            .get("agent_type")
            .or_else(|| map.get("type"))
            .and_then(Value::as_str);
        if let Some(label) = label {
            return ClassificationResult {
                agent_type: AgentType::from_label(label),
                domain_type: map
                    .get("domain_type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
        }
    }

    ClassificationResult::new(AgentType::from_label(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_llm::{GatewayConfig, MockProvider};
    use std::sync::Arc;

    fn classifier(mock: &MockProvider) -> Classifier {
        Classifier::new(LlmGateway::new(
            Arc::new(mock.clone()),
            GatewayConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_classify_label() {
        let mock = MockProvider::new();
        mock.on_prompt_containing(CLASSIFY_INSTRUCTION, " Calendar\n");
        let result = classifier(&mock).classify("I have a meeting tomorrow").await;
        assert_eq!(result.agent_type, AgentType::Calendar);
        assert!(result.domain_type.is_none());

        let prompt = &mock.prompts()[0];
        assert!(prompt.ends_with("Request: I have a meeting tomorrow ->"));
    }

    #[tokio::test]
    async fn test_classify_always_in_label_set() {
        let outputs = [
            "calendar",
            "I think this is a weather question",
            "{\"agent_type\": \"job search\", \"domain_type\": \"employment\"}",
            "task",
            "domain",
            "¯\\_(ツ)_/¯",
            "",
        ];
        let mock = MockProvider::new();
        for output in outputs {
            mock.push_response(output);
        }

        let classifier = classifier(&mock);
        for _ in outputs {
            let result = classifier.classify("anything").await;
            assert!(AgentType::ALL.contains(&result.agent_type));
        }
    }

    #[tokio::test]
    async fn test_classify_error_is_general() {
        let mock = MockProvider::new();
        mock.push_error(agentic_llm::Error::Network("down".into()));
        let result = classifier(&mock).classify("hello").await;
        assert_eq!(result.agent_type, AgentType::General);
    }

    #[test]
    fn test_parse_classification_object() {
        let result = parse_classification(r#"{"type": "post", "domain_type": "travel"}"#);
        assert_eq!(result.agent_type, AgentType::Post);
        assert_eq!(result.domain_type.as_deref(), Some("travel"));

        let result = parse_classification(r#"{"domain_type": "travel"}"#);
        assert_eq!(result.agent_type, AgentType::General);
    }
}
