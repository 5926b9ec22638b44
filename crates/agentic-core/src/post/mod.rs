//! Community post creation
//!
//! Two turns: the request is first placed in the closed board taxonomy, then
//! expanded into a full post and published.

#[cfg(test)]
mod tests;

use crate::error::Result;
use agentic_llm::{LlmGateway, TaskType};
use agentic_tools::PostPublisher;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub(crate) const POST_CLASSIFY_INSTRUCTION: &str =
    "Pick the board category and exactly one existing tag for this community post.";
pub(crate) const POST_COMPOSE_INSTRUCTION: &str =
    "Write a community post for the request below.";

const CLASSIFY_SCHEMA: &str =
    r#"{"category": "one of the categories", "tag": "one tag of that category", "post_type": "free or question"}"#;
const COMPOSE_SCHEMA: &str =
    r#"{"title": "post title", "content": "post body", "address": "place mentioned in the post, or empty"}"#;

/// Board categories and their fixed tags
const TAXONOMY: [(&str, [&str; 5]); 4] = [
    (
        "travel",
        ["sightseeing", "food", "accommodation", "transportation", "festival"],
    ),
    (
        "residence",
        ["housing", "visa", "banking", "healthcare", "daily-life"],
    ),
    (
        "study-abroad",
        ["admission", "scholarship", "language-school", "campus-life", "dormitory"],
    ),
    (
        "employment",
        ["job-search", "work-visa", "interview", "workplace", "part-time"],
    ),
];

const DEFAULT_CATEGORY: &str = "residence";

/// The closed category/tag taxonomy of the community board
pub struct PostTaxonomy;

impl PostTaxonomy {
    /// All category names
    pub fn categories() -> impl Iterator<Item = &'static str> {
        TAXONOMY.iter().map(|(category, _)| *category)
    }

    /// Tags of `category`
    #[must_use]
    pub fn tags(category: &str) -> Option<&'static [&'static str]> {
        TAXONOMY
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, tags)| tags.as_slice())
    }

    /// Category owning `tag`
    #[must_use]
    pub fn category_of(tag: &str) -> Option<&'static str> {
        TAXONOMY
            .iter()
            .find(|(_, tags)| tags.contains(&tag))
            .map(|(name, _)| *name)
    }

    /// Whether `tag` is one of `category`'s tags
    #[must_use]
    pub fn contains(category: &str, tag: &str) -> bool {
        Self::tags(category).is_some_and(|tags| tags.contains(&tag))
    }

    fn listing() -> String {
        TAXONOMY
            .iter()
            .map(|(name, tags)| format!("{name}: {}", tags.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Kind of board post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    /// Free-form post
    #[default]
    Free,
    /// Question to the community
    Question,
}

impl PostType {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Question => "question",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a post belongs on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostClassification {
    /// Taxonomy category
    pub category: String,
    /// One tag of `category`
    pub tag: String,
    /// Free post or question
    pub post_type: PostType,
}

impl Default for PostClassification {
    fn default() -> Self {
        let tag = PostTaxonomy::tags(DEFAULT_CATEGORY)
            .and_then(|tags| tags.first())
            .copied()
            .unwrap_or_default();
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            tag: tag.to_string(),
            post_type: PostType::Free,
        }
    }
}

/// The post sent to the community API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    /// Title
    pub title: String,
    /// Body
    pub content: String,
    /// Taxonomy category
    pub category: String,
    /// Two-letter language of the body
    pub language: String,
    /// Taxonomy tags
    pub tags: Vec<String>,
    /// Free post or question
    pub post_type: PostType,
    /// Place the post is about; empty when none
    pub address: String,
}

fn normalize_term(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Coerce a model classification into the taxonomy
///
/// A valid tag under the wrong category moves to its own category; an
/// unknown tag under a valid category takes that category's first tag;
/// anything else becomes the default classification.
#[must_use]
pub fn validate_classification(raw: &Map<String, Value>) -> PostClassification {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(normalize_term);
    let category = text("category").unwrap_or_default();
    let tag = text("tag").unwrap_or_default();
    let post_type = match text("post_type").or_else(|| text("postType")) {
        Some(kind) if kind.contains("question") => PostType::Question,
        _ => PostType::Free,
    };

    if PostTaxonomy::contains(&category, &tag) {
        return PostClassification {
            category,
            tag,
            post_type,
        };
    }

    if let Some(owner) = PostTaxonomy::category_of(&tag) {
        warn!(category = %category, tag = %tag, "Post tag filed under its own category");
        return PostClassification {
            category: owner.to_string(),
            tag,
            post_type,
        };
    }

    if let Some(first) = PostTaxonomy::tags(&category).and_then(|tags| tags.first()) {
        warn!(category = %category, tag = %tag, "Unknown post tag replaced");
        return PostClassification {
            category,
            tag: (*first).to_string(),
            post_type,
        };
    }

    warn!(category = %category, tag = %tag, "Unknown post category, using default");
    PostClassification {
        post_type,
        ..PostClassification::default()
    }
}

/// Language of `text` by script, falling back to `hint` then English
#[must_use]
pub fn detect_language(text: &str, hint: Option<&str>) -> String {
    let has = |range: &[(u32, u32)]| {
        text.chars()
            .any(|c| range.iter().any(|(lo, hi)| (*lo..=*hi).contains(&(c as u32))))
    };

    if has(&[(0xAC00, 0xD7A3), (0x1100, 0x11FF), (0x3130, 0x318F)]) {
        return "ko".to_string();
    }
    if has(&[(0x3040, 0x30FF)]) {
        return "ja".to_string();
    }
    if has(&[(0x4E00, 0x9FFF)]) {
        return "zh".to_string();
    }

    hint.map(|h| h.trim().to_lowercase())
        .filter(|h| h.len() == 2 && h.chars().all(|c| c.is_ascii_lowercase()))
        .unwrap_or_else(|| "en".to_string())
}

/// Language of a post: the user's input language when it is a two-letter
/// code, otherwise whatever the body's script says
#[must_use]
pub fn post_language(user_lang: &str, content: &str) -> String {
    let user_lang = user_lang.trim().to_lowercase();
    if user_lang.len() == 2 && user_lang.chars().all(|c| c.is_ascii_lowercase()) {
        return user_lang;
    }
    detect_language(content, None)
}

/// Classifies, composes and publishes community posts
#[derive(Clone)]
pub struct PostService {
    llm: LlmGateway,
    publisher: Arc<dyn PostPublisher>,
}

impl PostService {
    /// Create a service
    pub fn new(llm: LlmGateway, publisher: Arc<dyn PostPublisher>) -> Self {
        Self { llm, publisher }
    }

    /// Place the request in the taxonomy; never fails
    #[instrument(skip_all)]
    pub async fn first_query(&self, query: &str) -> PostClassification {
        let prompt = format!(
            "{POST_CLASSIFY_INSTRUCTION} Never invent a new category or tag.\n\n\
             Categories and tags:\n{}\n\nRequest: {query}",
            PostTaxonomy::listing()
        );

        match self
            .llm
            .generate_structured(TaskType::Classification.recommended_tier(), &prompt, CLASSIFY_SCHEMA)
            .await
        {
            Ok(Value::Object(raw)) => validate_classification(&raw),
            Ok(_) => PostClassification::default(),
            Err(e) => {
                warn!(error = %e, "Post classification failed, using default");
                PostClassification::default()
            }
        }
    }

    /// Expand the request into a post without publishing it
    pub async fn compose(
        &self,
        query: &str,
        title: &str,
        classification: &PostClassification,
        lang_code: &str,
    ) -> Result<PostDraft> {
        let prompt = format!(
            "{POST_COMPOSE_INSTRUCTION} Write it in the same language as the request \
             (language code: {lang_code}).\n\n\
             Category: {}\nTag: {}\nPost type: {}\nTitle: {title}\nRequest: {query}",
            classification.category, classification.tag, classification.post_type
        );

        let fields = match self
            .llm
            .generate_structured(TaskType::Generation.recommended_tier(), &prompt, COMPOSE_SCHEMA)
            .await
        {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(agentic_llm::Error::Parse(reason)) => {
                warn!(reason = %reason, "Post body not decodable, using the request");
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let title = match title.trim() {
            "" => text("title")
                .map(str::to_string)
                .unwrap_or_else(|| query.chars().take(40).collect()),
            given => given.to_string(),
        };
        let content = text("content").unwrap_or(query).to_string();

        Ok(PostDraft {
            language: post_language(lang_code, &content),
            title,
            content,
            category: classification.category.clone(),
            tags: vec![classification.tag.clone()],
            post_type: classification.post_type,
            address: text("address").unwrap_or_default().to_string(),
        })
    }

    /// Compose the post and publish it once
    #[instrument(skip_all, fields(category = %classification.category))]
    pub async fn second_query(
        &self,
        token: &str,
        query: &str,
        title: &str,
        classification: &PostClassification,
        lang_code: &str,
    ) -> Result<(PostDraft, Value)> {
        let draft = self.compose(query, title, classification, lang_code).await?;
        let body = serde_json::to_value(&draft)?;

        let published = self.publisher.publish(token, &body).await.map_err(|e| {
            error!(error = %e, "Publishing post failed");
            e
        })?;
        info!(language = %draft.language, "Post published");
        Ok((draft, published))
    }
}
