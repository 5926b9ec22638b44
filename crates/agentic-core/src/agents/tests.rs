use super::*;
use crate::conversation::{ConversationKind, ConversationStep};
use crate::post::{POST_CLASSIFY_INSTRUCTION, POST_COMPOSE_INSTRUCTION};
use crate::testing::Fakes;
use agentic_llm::MockProvider;
use agentic_tools::{CalendarEvent, EventDraft};
use serde_json::{json, Map, Value};

fn request(query: &str, state: &str) -> AgentRequest {
    AgentRequest {
        query: query.to_string(),
        english_query: query.to_string(),
        uid: "u1".to_string(),
        token: "tok".to_string(),
        state: state.to_string(),
        lang_code: "en".to_string(),
    }
}

struct DownCalendar;

#[async_trait::async_trait]
impl CalendarBackend for DownCalendar {
    async fn list_events(&self, _token: &str) -> agentic_tools::Result<Vec<CalendarEvent>> {
        Err(agentic_tools::Error::Timeout(5000))
    }

    async fn create_event(&self, _token: &str, _draft: &EventDraft) -> agentic_tools::Result<Value> {
        Err(agentic_tools::Error::Timeout(5000))
    }

    async fn patch_event(
        &self,
        _token: &str,
        _id: &str,
        _changes: &Map<String, Value>,
    ) -> agentic_tools::Result<Value> {
        Err(agentic_tools::Error::Timeout(5000))
    }

    async fn delete_event(&self, _token: &str, _id: &str) -> agentic_tools::Result<()> {
        Err(agentic_tools::Error::Timeout(5000))
    }
}

struct Fixed(AgentType);

#[async_trait::async_trait]
impl AgentHandler for Fixed {
    fn agent_type(&self) -> AgentType {
        self.0
    }

    async fn handle(&self, _request: &AgentRequest) -> Result<AgentResponse> {
        Ok(AgentResponse::text(self.0.as_str()))
    }
}

#[test]
fn test_standard_registry_covers_every_type() {
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&MockProvider::new()));
    assert_eq!(registry.agent_types(), AgentType::ALL.to_vec());
    for agent_type in AgentType::ALL {
        assert_eq!(registry.get(agent_type).unwrap().agent_type(), agent_type);
    }
}

#[tokio::test]
async fn test_dispatch_falls_back_to_general() {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(Fixed(AgentType::General)));
    registry.register(Arc::new(Fixed(AgentType::Dog)));

    let dog = registry.dispatch(AgentType::Dog, &request("dog", "")).await.unwrap();
    assert_eq!(dog.response, "dog");
    let weather = registry
        .dispatch(AgentType::Weather, &request("rain?", ""))
        .await
        .unwrap();
    assert_eq!(weather.response, "general");
}

#[tokio::test]
async fn test_registry_without_general_is_misconfigured() {
    let registry = HandlerRegistry::new();
    let err = registry
        .dispatch(AgentType::Cat, &request("cat", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn test_calendar_failure_is_an_error_response() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(crate::calendar::ACTION_INSTRUCTION, "check");
    let agent = CalendarAgent::new(CalendarService::new(
        crate::testing::gateway(&mock),
        Arc::new(DownCalendar),
    ));

    let response = agent.handle(&request("Show my schedule", "")).await.unwrap();
    assert!(response.is_error());
    assert_eq!(response.metadata["error_kind"], "upstream");
    assert!(!response.response.contains("5000"));
}

#[tokio::test]
async fn test_resume_agent_follows_caller_state() {
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&MockProvider::new()));

    let started = registry
        .dispatch(AgentType::Resume, &request("I want a résumé", "first"))
        .await
        .unwrap();
    assert_eq!(started.state.as_deref(), Some("second"));
    assert_eq!(started.metadata["conversation"], "resume");

    let invalid = registry
        .dispatch(AgentType::Resume, &request("hello", "bogus"))
        .await
        .unwrap();
    assert!(invalid.is_error());
    assert_eq!(invalid.metadata["error_kind"], "protocol");

    let skipped = registry
        .dispatch(AgentType::Resume, &request("hello", "fourth"))
        .await
        .unwrap();
    assert!(skipped.is_error());
    let stored = fakes.store.get("u1", ConversationKind::Resume).await.unwrap().unwrap();
    assert_eq!(stored.step, ConversationStep::Second);
}

#[tokio::test]
async fn test_post_two_turns() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(
        POST_CLASSIFY_INSTRUCTION,
        r#"{"category": "travel", "tag": "food", "post_type": "question"}"#,
    );
    mock.on_prompt_containing(
        POST_COMPOSE_INSTRUCTION,
        r#"{"content": "Where can I find good naengmyeon in Seoul?", "address": "Seoul"}"#,
    );
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&mock));

    let first = registry
        .dispatch(AgentType::Post, &request("Ask about naengmyeon places", "first"))
        .await
        .unwrap();
    assert_eq!(first.state.as_deref(), Some("second"));
    assert_eq!(first.metadata["classification"]["postType"], "question");

    let again = registry
        .dispatch(AgentType::Post, &request("another post", "first"))
        .await
        .unwrap();
    assert!(again.is_error());

    let second = registry
        .dispatch(AgentType::Post, &request("Best naengmyeon?", "second"))
        .await
        .unwrap();
    assert_eq!(second.state.as_deref(), Some("first"));
    assert_eq!(second.metadata["post"]["title"], "Best naengmyeon?");
    assert_eq!(second.metadata["post"]["category"], "travel");

    let published = fakes.publisher.published.lock().unwrap().clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1["tags"], json!(["food"]));
    assert!(fakes.store.get("u1", ConversationKind::Post).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_post_titles_publish_once() {
    let mock = MockProvider::new().with_delay(std::time::Duration::from_millis(50));
    mock.on_prompt_containing(
        POST_CLASSIFY_INSTRUCTION,
        r#"{"category": "travel", "tag": "food", "post_type": "question"}"#,
    );
    mock.on_prompt_containing(POST_COMPOSE_INSTRUCTION, r#"{"content": "Any tips?"}"#);
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&mock));

    registry
        .dispatch(AgentType::Post, &request("Ask about naengmyeon places", "first"))
        .await
        .unwrap();

    let title_a = request("Title A", "second");
    let title_b = request("Title B", "second");
    let (a, b) = tokio::join!(
        registry.dispatch(AgentType::Post, &title_a),
        registry.dispatch(AgentType::Post, &title_b),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(!a.is_error());
    assert!(b.is_error());
    assert_eq!(fakes.publisher.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_post_language_follows_first_turn() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(
        POST_CLASSIFY_INSTRUCTION,
        r#"{"category": "residence", "tag": "visa", "post_type": "question"}"#,
    );
    mock.on_prompt_containing(
        POST_COMPOSE_INSTRUCTION,
        r#"{"content": "Xin chào, tôi muốn hỏi về gia hạn visa D-2."}"#,
    );
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&mock));

    let mut first = request("Tôi muốn hỏi về gia hạn visa D-2", "first");
    first.lang_code = "vi".to_string();
    registry.dispatch(AgentType::Post, &first).await.unwrap();

    // A short title can be detected as another language; the post keeps the first turn's.
    let second = registry
        .dispatch(AgentType::Post, &request("Visa D-2", "second"))
        .await
        .unwrap();
    assert_eq!(second.metadata["post"]["language"], "vi");
}

#[tokio::test]
async fn test_post_rejects_steps_it_does_not_have() {
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&MockProvider::new()));

    let response = registry
        .dispatch(AgentType::Post, &request("title", "third"))
        .await
        .unwrap();
    assert!(response.is_error());

    let missing = registry
        .dispatch(AgentType::Post, &request("title", "second"))
        .await
        .unwrap();
    assert!(missing.is_error());
    assert!(missing.response.contains("post"));
}

#[tokio::test]
async fn test_weather_uses_extracted_location() {
    let mock = MockProvider::new();
    mock.on_prompt_containing(super::lookup::LOCATION_INSTRUCTION, r#"{"location": "Busan"}"#);
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&mock));

    let response = registry
        .dispatch(AgentType::Weather, &request("Is it raining in Busan?", ""))
        .await
        .unwrap();
    assert!(response.response.starts_with("Weather in Busan: Partly cloudy"));
    assert_eq!(response.metadata["weather"]["humidity"], 55);
}

#[tokio::test]
async fn test_job_search_uses_job_interest() {
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&MockProvider::new()));

    let response = registry
        .dispatch(AgentType::JobSearch, &request("part-time work", ""))
        .await
        .unwrap();
    assert_eq!(response.metadata["job_interest"], "translator");
    assert_eq!(
        response.metadata["search_query"],
        "part-time work translator jobs in Korea"
    );
}

#[tokio::test]
async fn test_location_without_place_search() {
    let fakes = Fakes::new();
    let mut collab = fakes.collaborators(&MockProvider::new());
    collab.places = None;
    let registry = HandlerRegistry::standard(&collab);

    let response = registry
        .dispatch(AgentType::Location, &request("immigration office", ""))
        .await
        .unwrap();
    assert!(response.is_error());
    assert_eq!(response.metadata["error_kind"], "internal");
}

#[tokio::test]
async fn test_animal_agents_return_links() {
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&MockProvider::new()));

    let dog = registry.dispatch(AgentType::Dog, &request("dog", "")).await.unwrap();
    assert_eq!(dog.url.as_deref(), Some("https://dog.test/1.jpg"));

    let cat = registry.dispatch(AgentType::Cat, &request("cat", "")).await.unwrap();
    assert_eq!(cat.url.as_deref(), Some("https://cat.test/1.jpg"));
    assert!(cat.response.contains("Cats sleep a lot."));
}

#[tokio::test]
async fn test_general_agent_includes_profile() {
    let mock = MockProvider::new();
    mock.push_response("  Hello Mina!  ");
    let fakes = Fakes::new();
    let registry = HandlerRegistry::standard(&fakes.collaborators(&mock));

    let response = registry
        .dispatch(AgentType::General, &request("hi", ""))
        .await
        .unwrap();
    assert_eq!(response.response, "Hello Mina!");
    assert!(mock.prompts()[0].contains("\"nation\":\"Vietnam\""));
}
