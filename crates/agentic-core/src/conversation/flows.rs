//! Résumé and cover-letter flows

use super::document::{escape_html, page, paragraphs, section};
use super::engine::ConversationFlow;
use super::state::{ConversationKind, ConversationStep};
use crate::error::{Error, Result};
use agentic_llm::{LlmGateway, TaskType};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

pub(crate) const EXTRACT_INSTRUCTION: &str =
    "Extract structured fields from the user's answer.";

pub(crate) const COVER_LETTER_INSTRUCTION: &str =
    "Write a cover letter from the applicant details below.";

/// How one answer is turned into fields
struct AnswerSpec {
    /// What the answer is about
    topic: &'static str,
    schema: &'static str,
    /// Keys the answer may set
    keys: &'static [&'static str],
    /// Keys that default to an empty list
    list_keys: &'static [&'static str],
    /// Key that receives the raw text when extraction fails
    fallback_key: &'static str,
}

async fn extract_fields(llm: &LlmGateway, spec: &AnswerSpec, answer: &str) -> Map<String, Value> {
    let prompt = format!(
        "{EXTRACT_INSTRUCTION} The answer describes {}. Keep the user's language. \
         Use empty strings or empty lists for anything not mentioned.\n\nAnswer:\n{answer}",
        spec.topic
    );

    let extracted = match llm
        .generate_structured(TaskType::Extraction.recommended_tier(), &prompt, spec.schema)
        .await
    {
        Ok(Value::Object(map)) => map,
        Ok(Value::Array(items)) => items
            .into_iter()
            .find_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default(),
        Ok(_) => Map::new(),
        Err(e) => {
            warn!(topic = spec.topic, error = %e, "Answer extraction failed, keeping raw text");
            Map::new()
        }
    };

    let mut fields: Map<String, Value> = extracted
        .into_iter()
        .filter(|(key, _)| spec.keys.contains(&key.as_str()))
        .collect();

    if fields.is_empty() {
        fields.insert(
            spec.fallback_key.to_string(),
            Value::String(answer.trim().to_string()),
        );
    }
    for key in spec.list_keys {
        fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
    }
    fields
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields.get(key).and_then(Value::as_str).map(str::trim).unwrap_or_default()
}

const RESUME_EDUCATION: AnswerSpec = AnswerSpec {
    topic: "education history and certifications",
    schema: r#"{"education": [{"school": "", "major": "", "degree": "", "period": ""}], "certifications": [{"name": "", "issuer": "", "date": ""}]}"#,
    keys: &["education", "certifications"],
    list_keys: &["certifications"],
    fallback_key: "education",
};

const RESUME_CAREER: AnswerSpec = AnswerSpec {
    topic: "work experience",
    schema: r#"{"career": [{"company": "", "role": "", "period": "", "achievements": [""]}]}"#,
    keys: &["career"],
    list_keys: &[],
    fallback_key: "career",
};

const RESUME_PROFILE: AnswerSpec = AnswerSpec {
    topic: "skills, a self-introduction and the desired position",
    schema: r#"{"skills": [""], "introduction": "", "desired_position": ""}"#,
    keys: &["skills", "introduction", "desired_position"],
    list_keys: &["skills"],
    fallback_key: "introduction",
};

/// Education → career → skills, rendered as a résumé
#[derive(Clone)]
pub struct ResumeFlow {
    llm: LlmGateway,
}

impl ResumeFlow {
    /// Create the flow
    #[must_use]
    pub fn new(llm: LlmGateway) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ConversationFlow for ResumeFlow {
    fn kind(&self) -> ConversationKind {
        ConversationKind::Resume
    }

    fn question(&self, step: ConversationStep) -> Option<&'static str> {
        match step {
            ConversationStep::Second => Some(
                "Let's build your résumé. First, tell me about your education \
                 (school, major, degree, period) and any certifications you hold.",
            ),
            ConversationStep::Third => Some(
                "Thanks! Now describe your work experience: company, role, period \
                 and main achievements for each position.",
            ),
            ConversationStep::Fourth => Some(
                "Last question: what are your key skills, how would you introduce \
                 yourself in a few sentences, and which position are you looking for?",
            ),
            _ => None,
        }
    }

    async fn parse_answer(&self, step: ConversationStep, answer: &str) -> Map<String, Value> {
        let spec = match step {
            ConversationStep::Second => &RESUME_EDUCATION,
            ConversationStep::Third => &RESUME_CAREER,
            _ => &RESUME_PROFILE,
        };
        extract_fields(&self.llm, spec, answer).await
    }

    async fn compose(&self, fields: &Map<String, Value>) -> Result<String> {
        let mut body = String::new();
        let desired = text_field(fields, "desired_position");
        if !desired.is_empty() {
            body.push_str(&format!(
                "<p><strong>Desired position:</strong> {}</p>\n",
                escape_html(desired)
            ));
        }
        body.push_str(&section("Introduction", fields.get("introduction")));
        body.push_str(&section("Education", fields.get("education")));
        body.push_str(&section("Certifications", fields.get("certifications")));
        body.push_str(&section("Career", fields.get("career")));
        body.push_str(&section("Skills", fields.get("skills")));

        if body.trim().is_empty() {
            return Err(Error::Parse("no résumé content collected".to_string()));
        }
        Ok(page("Résumé", &body))
    }
}

const LETTER_TARGET: AnswerSpec = AnswerSpec {
    topic: "the job being applied for and the applicant's skills",
    schema: r#"{"target_job": "", "company": "", "skills": [""]}"#,
    keys: &["target_job", "company", "skills"],
    list_keys: &["skills"],
    fallback_key: "target_job",
};

const LETTER_EXPERIENCE: AnswerSpec = AnswerSpec {
    topic: "relevant experience",
    schema: r#"{"experiences": [{"title": "", "period": "", "description": ""}]}"#,
    keys: &["experiences"],
    list_keys: &[],
    fallback_key: "experiences",
};

const LETTER_MOTIVATION: AnswerSpec = AnswerSpec {
    topic: "motivation for applying and future goals",
    schema: r#"{"motivation": "", "goals": ""}"#,
    keys: &["motivation", "goals"],
    list_keys: &[],
    fallback_key: "motivation",
};

/// Target job → experience → motivation, written up by the model
#[derive(Clone)]
pub struct CoverLetterFlow {
    llm: LlmGateway,
}

impl CoverLetterFlow {
    /// Create the flow
    #[must_use]
    pub fn new(llm: LlmGateway) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ConversationFlow for CoverLetterFlow {
    fn kind(&self) -> ConversationKind {
        ConversationKind::CoverLetter
    }

    fn question(&self, step: ConversationStep) -> Option<&'static str> {
        match step {
            ConversationStep::Second => Some(
                "Let's write your cover letter. Which job (and company) are you \
                 applying for, and what skills do you bring to it?",
            ),
            ConversationStep::Third => Some(
                "Great. Tell me about the experience most relevant to this job.",
            ),
            ConversationStep::Fourth => Some(
                "Finally, why do you want this job, and what would you like to \
                 achieve there?",
            ),
            _ => None,
        }
    }

    async fn parse_answer(&self, step: ConversationStep, answer: &str) -> Map<String, Value> {
        let spec = match step {
            ConversationStep::Second => &LETTER_TARGET,
            ConversationStep::Third => &LETTER_EXPERIENCE,
            _ => &LETTER_MOTIVATION,
        };
        extract_fields(&self.llm, spec, answer).await
    }

    async fn compose(&self, fields: &Map<String, Value>) -> Result<String> {
        let details = serde_json::to_string_pretty(fields)?;
        let prompt = format!(
            "{COVER_LETTER_INSTRUCTION} Write four or five paragraphs separated by blank \
             lines, in the same language as the details. Output only the letter text.\n\n\
             Applicant details:\n{details}"
        );

        let letter = self.llm.generate_for(TaskType::Generation, &prompt).await?;
        let body = paragraphs(&letter);
        if body.is_empty() {
            return Err(Error::Parse("empty cover letter".to_string()));
        }

        let job = text_field(fields, "target_job");
        let title = if job.is_empty() {
            "Cover Letter".to_string()
        } else {
            format!("Cover Letter: {job}")
        };
        Ok(page(&title, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_llm::{GatewayConfig, MockProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn gateway(mock: &MockProvider) -> LlmGateway {
        LlmGateway::new(Arc::new(mock.clone()), GatewayConfig::default())
    }

    #[tokio::test]
    async fn test_extract_filters_keys_and_fills_lists() {
        let mock = MockProvider::new();
        mock.push_response(
            "Here you go: {'education': [{'school': 'KAIST', 'major': 'CS'}], 'career': 'leak'}",
        );
        let flow = ResumeFlow::new(gateway(&mock));

        let fields = flow
            .parse_answer(ConversationStep::Second, "KAIST CS")
            .await;
        assert_eq!(fields["education"][0]["school"], "KAIST");
        assert_eq!(fields["certifications"], json!([]));
        assert!(!fields.contains_key("career"));
    }

    #[tokio::test]
    async fn test_extract_degenerates_to_raw_text() {
        let mock = MockProvider::new();
        mock.push_response("I could not find any structure, sorry");
        mock.push_error(agentic_llm::Error::Timeout(5));
        let flow = ResumeFlow::new(gateway(&mock));

        let fields = flow
            .parse_answer(ConversationStep::Third, "  Samsung, 2019-2023, engineer ")
            .await;
        assert_eq!(fields["career"], "Samsung, 2019-2023, engineer");

        let fields = flow.parse_answer(ConversationStep::Fourth, "Rust, Go").await;
        assert_eq!(fields["introduction"], "Rust, Go");
        assert_eq!(fields["skills"], json!([]));
    }

    #[tokio::test]
    async fn test_resume_compose() {
        let flow = ResumeFlow::new(gateway(&MockProvider::new()));
        let fields = json!({
            "education": [{"school": "KAIST", "degree": "BS"}],
            "certifications": [],
            "career": "Samsung <2019>",
            "skills": ["Rust", "SQL"],
            "introduction": "",
            "desired_position": "Backend engineer"
        });
        let html = flow.compose(fields.as_object().unwrap()).await.unwrap();

        assert!(html.contains("<h1>Résumé</h1>"));
        assert!(html.contains("Backend engineer"));
        assert!(html.contains("<li>BS · KAIST</li>"));
        assert!(html.contains("Samsung &lt;2019&gt;"));
        assert!(!html.contains("<h2>Certifications</h2>"));
        assert!(!html.contains("<h2>Introduction</h2>"));
    }

    #[tokio::test]
    async fn test_resume_compose_rejects_empty() {
        let flow = ResumeFlow::new(gateway(&MockProvider::new()));
        let err = flow.compose(&Map::new()).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_cover_letter_compose_uses_model() {
        let mock = MockProvider::new();
        mock.on_prompt_containing(
            COVER_LETTER_INSTRUCTION,
            "Dear hiring manager,\n\nI am applying.\n\nSincerely",
        );
        let flow = CoverLetterFlow::new(gateway(&mock));
        let fields = json!({"target_job": "Designer", "motivation": "love"});

        let html = flow.compose(fields.as_object().unwrap()).await.unwrap();
        assert!(html.contains("<h1>Cover Letter: Designer</h1>"));
        assert_eq!(html.matches("<p>").count(), 3);
        assert!(mock.prompts()[0].contains("\"motivation\": \"love\""));
    }

    #[test]
    fn test_every_continuation_step_has_a_question() {
        let mock = MockProvider::new();
        let resume = ResumeFlow::new(gateway(&mock));
        let letter = CoverLetterFlow::new(gateway(&mock));
        for step in [
            ConversationStep::Second,
            ConversationStep::Third,
            ConversationStep::Fourth,
        ] {
            assert!(resume.question(step).is_some());
            assert!(letter.question(step).is_some());
        }
        assert!(resume.question(ConversationStep::First).is_none());
    }
}
