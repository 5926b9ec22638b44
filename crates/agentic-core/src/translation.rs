//! Translation stage
//!
//! Every query is reduced to an English working query before
//! classification. The stage never fails: when the model is unreachable or
//! answers with garbage, [`heuristic_detect`] decides the language.

use crate::error::{Error, Result};
use crate::types::TranslationResult;
use agentic_llm::{LlmGateway, ModelTier, TaskType};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

lazy_static! {
    static ref ENGLISH_TEXT: Regex =
        Regex::new(r#"^[a-zA-Z\s'",.!?-]+$"#).expect("valid english text regex");
}

pub(crate) const DETECT_INSTRUCTION: &str =
    "Detect the language of the user message and translate it into English.";

pub(crate) const TRANSLATE_BACK_INSTRUCTION: &str =
    "Translate the assistant answer below into the target language.";

const DETECT_SCHEMA: &str =
    r#"{"lang_code": "two-letter ISO 639-1 code of the message", "translated_query": "the message in English"}"#;

/// Language detection and translation over the lightweight tier
#[derive(Clone)]
pub struct Translator {
    llm: LlmGateway,
}

impl Translator {
    /// Create a translator
    #[must_use]
    pub fn new(llm: LlmGateway) -> Self {
        Self { llm }
    }

    /// Detect the language of `query` and produce its English form
    #[instrument(skip(self, query))]
    pub async fn translate(&self, query: &str) -> TranslationResult {
        if query.trim().is_empty() {
            return heuristic_detect(query);
        }

        let prompt = format!(
            "{DETECT_INSTRUCTION} If it is already English, return it unchanged.\n\nMessage:\n{query}"
        );

        match self
            .llm
            .generate_structured(ModelTier::Lightweight, &prompt, DETECT_SCHEMA)
            .await
        {
            Ok(value) => match read_detection(&value, query) {
                Some(result) => {
                    debug!(lang = %result.lang_code, "Detected query language");
                    result
                }
                None => {
                    warn!("Translation output incomplete, using heuristic detection");
                    heuristic_detect(query)
                }
            },
            Err(e) => {
                warn!(error = %e, "Translation failed, using heuristic detection");
                heuristic_detect(query)
            }
        }
    }

    /// Translate an answer back into `lang_code`
    ///
    /// English targets and blank text are returned as-is without a model call.
    #[instrument(skip(self, text))]
    pub async fn translate_back(&self, text: &str, lang_code: &str) -> Result<String> {
        if lang_code.eq_ignore_ascii_case("en") || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let prompt = format!(
            "{TRANSLATE_BACK_INSTRUCTION} Keep links, numbers and names as they are. \
             Answer with the translation only.\n\nTarget language: {lang_code}\n\nAnswer:\n{text}"
        );

        let translated = self.llm.generate_for(TaskType::Translation, &prompt).await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(Error::Parse("empty translation".to_string()));
        }
        Ok(translated.to_string())
    }
}

fn read_detection(value: &Value, query: &str) -> Option<TranslationResult> {
    let lang_code = value
        .get("lang_code")
        .and_then(Value::as_str)
        .map(|code| code.trim().to_ascii_lowercase())
        .filter(|code| code.len() == 2 && code.chars().all(|c| c.is_ascii_lowercase()))?;

    let is_english = lang_code == "en";
    let translated_query = if is_english {
        query.to_string()
    } else {
        value
            .get("translated_query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())?
            .to_string()
    };

    Some(TranslationResult {
        translated_query,
        lang_code,
        is_english,
    })
}

/// Decide the language without a model
///
/// Text made only of ASCII letters, whitespace and basic punctuation is
/// English; everything else is assumed to be Korean. The query is returned
/// unchanged either way.
///
/// # Examples
/// ```
/// use agentic_core::heuristic_detect;
/// assert!(heuristic_detect("What's the weather?").is_english);
/// assert_eq!(heuristic_detect("날씨 어때?").lang_code, "ko");
/// ```
#[must_use]
pub fn heuristic_detect(query: &str) -> TranslationResult {
    let is_english = ENGLISH_TEXT.is_match(query);
    TranslationResult {
        translated_query: query.to_string(),
        lang_code: if is_english { "en" } else { "ko" }.to_string(),
        is_english,
    }
}
