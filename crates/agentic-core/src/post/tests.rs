use super::*;
use crate::error::Error;
use crate::testing::{gateway, FakePublisher};
use agentic_llm::MockProvider;
use serde_json::json;

fn raw(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_taxonomy_is_closed() {
    assert_eq!(
        PostTaxonomy::categories().collect::<Vec<_>>(),
        vec!["travel", "residence", "study-abroad", "employment"]
    );
    for category in PostTaxonomy::categories() {
        assert_eq!(PostTaxonomy::tags(category).unwrap().len(), 5);
    }
    assert!(PostTaxonomy::contains("travel", "food"));
    assert!(!PostTaxonomy::contains("travel", "visa"));
    assert_eq!(PostTaxonomy::category_of("work-visa"), Some("employment"));
}

#[test]
fn test_validate_accepts_known_pair() {
    let classification = validate_classification(&raw(json!({
        "category": "Study Abroad",
        "tag": "language_school",
        "post_type": "Question"
    })));
    assert_eq!(classification.category, "study-abroad");
    assert_eq!(classification.tag, "language-school");
    assert_eq!(classification.post_type, PostType::Question);
}

#[test]
fn test_validate_repairs_invented_values() {
    let moved = validate_classification(&raw(json!({"category": "travel", "tag": "visa"})));
    assert_eq!(moved.category, "residence");
    assert_eq!(moved.tag, "visa");

    let replaced = validate_classification(&raw(json!({"category": "employment", "tag": "salary"})));
    assert_eq!(replaced.category, "employment");
    assert_eq!(replaced.tag, "job-search");

    let invented = validate_classification(&raw(json!({"category": "shopping", "tag": "deals"})));
    assert_eq!(invented, PostClassification::default());
    assert_eq!(invented.category, "residence");
    assert_eq!(invented.tag, "housing");
}

#[test]
fn test_classification_serializes_post_type_camel_case() {
    let value = serde_json::to_value(PostClassification::default()).unwrap();
    assert_eq!(value["postType"], "free");
    assert!(value.get("post_type").is_none());
}

#[test]
fn test_detect_language() {
    assert_eq!(detect_language("부산 맛집 추천해 주세요", Some("en")), "ko");
    assert_eq!(detect_language("東京のおすすめ", None), "ja");
    assert_eq!(detect_language("北京烤鸭", None), "zh");
    assert_eq!(detect_language("Bonjour à tous", Some("FR")), "fr");
    assert_eq!(detect_language("Hello", Some("english")), "en");
    assert_eq!(detect_language("Hello", None), "en");
}

#[test]
fn test_post_language_prefers_user_language() {
    assert_eq!(post_language("vi", "Xin chào"), "vi");
    assert_eq!(post_language(" ES ", "Hola a todos"), "es");
    assert_eq!(post_language("", "부산 맛집"), "ko");
    assert_eq!(post_language("unknown", "Hello"), "en");
}

#[tokio::test]
async fn test_latin_script_post_keeps_user_language() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(
        POST_COMPOSE_INSTRUCTION,
        r#"{"title": "Gia hạn visa", "content": "Xin chào, tôi muốn hỏi về gia hạn visa D-2 ở Seoul.", "address": ""}"#,
    );
    let publisher = Arc::new(FakePublisher::default());
    let service = PostService::new(gateway(&mock), publisher.clone());

    let (draft, _) = service
        .second_query(
            "tok",
            "Xin chào, tôi muốn hỏi về gia hạn visa D-2",
            "Gia hạn visa D-2",
            &PostClassification::default(),
            "vi",
        )
        .await
        .unwrap();

    assert_eq!(draft.language, "vi");
    assert_eq!(publisher.published.lock().unwrap()[0].1["language"], "vi");
    assert!(mock
        .prompts()
        .iter()
        .any(|p| p.contains(POST_COMPOSE_INSTRUCTION) && p.contains("language code: vi")));
}

#[tokio::test]
async fn test_first_query_validates_model_output() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(
        POST_CLASSIFY_INSTRUCTION,
        r#"{"category": "travel", "tag": "street-food", "post_type": "free"}"#,
    );
    let service = PostService::new(gateway(&mock), Arc::new(FakePublisher::default()));

    let classification = service.first_query("Recommend street food in Busan").await;
    assert_eq!(classification.category, "travel");
    assert_eq!(classification.tag, "sightseeing");

    let prompt = &mock.prompts()[0];
    assert!(prompt.contains("study-abroad: admission"));
}

#[tokio::test]
async fn test_first_query_falls_back_on_failure() {
    let mock = MockProvider::new();
    mock.push_error(agentic_llm::Error::Network("down".into()));
    let service = PostService::new(gateway(&mock), Arc::new(FakePublisher::default()));

    assert_eq!(
        service.first_query("anything").await,
        PostClassification::default()
    );
}

#[tokio::test]
async fn test_second_query_publishes_once() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(
        POST_COMPOSE_INSTRUCTION,
        r#"{"title": "ignored", "content": "해운대 근처 돼지국밥집을 찾고 있어요.", "address": "부산 해운대구"}"#,
    );
    let publisher = Arc::new(FakePublisher::default());
    let service = PostService::new(gateway(&mock), publisher.clone());
    let classification = PostClassification {
        category: "travel".into(),
        tag: "food".into(),
        post_type: PostType::Question,
    };

    let (draft, _) = service
        .second_query("tok", "부산 맛집 질문", "돼지국밥 어디가 좋아요?", &classification, "ko")
        .await
        .unwrap();

    assert_eq!(draft.title, "돼지국밥 어디가 좋아요?");
    assert_eq!(draft.language, "ko");
    assert_eq!(draft.address, "부산 해운대구");
    assert_eq!(draft.tags, vec!["food".to_string()]);

    let published = publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    let (token, body) = &published[0];
    assert_eq!(token, "tok");
    assert_eq!(body["postType"], "question");
    assert_eq!(body["category"], "travel");
}

#[tokio::test]
async fn test_compose_degrades_to_request_text() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(POST_COMPOSE_INSTRUCTION, "Sorry, I can't format that.");
    let service = PostService::new(gateway(&mock), Arc::new(FakePublisher::default()));

    let draft = service
        .compose(
            "Looking for a roommate near Sinchon",
            "",
            &PostClassification::default(),
            "en",
        )
        .await
        .unwrap();
    assert_eq!(draft.content, "Looking for a roommate near Sinchon");
    assert_eq!(draft.title, "Looking for a roommate near Sinchon");
    assert_eq!(draft.language, "en");
    assert_eq!(draft.address, "");
}

#[tokio::test]
async fn test_publish_failure_is_surfaced() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(POST_COMPOSE_INSTRUCTION, r#"{"content": "body"}"#);
    let publisher = Arc::new(FakePublisher {
        fail: true,
        ..FakePublisher::default()
    });
    let service = PostService::new(gateway(&mock), publisher.clone());

    let err = service
        .second_query("tok", "q", "t", &PostClassification::default(), "en")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Tool(_)));
    assert_eq!(publisher.published.lock().unwrap().len(), 1);
}
