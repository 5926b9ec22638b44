//! Fake collaborators shared by unit tests

use crate::agents::Collaborators;
use crate::conversation::{ConversationStore, MemoryConversationStore};
use crate::janitor::ArtifactJanitor;
use agentic_llm::{GatewayConfig, LlmGateway, MockProvider};
use agentic_tools::{
    AnimalApi, CalendarBackend, CalendarEvent, DocumentRenderer, Error as ToolError, EventDraft,
    ObjectStorage, Place, PlaceSearch, PostPublisher, ProfileService, Result as ToolResult,
    SearchHit, WeatherProvider, WeatherReport, WebSearch,
};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub fn gateway(mock: &MockProvider) -> LlmGateway {
    LlmGateway::new(Arc::new(mock.clone()), GatewayConfig::default())
}

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_upload: bool,
}

#[async_trait::async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, local_path: &Path, key: &str) -> ToolResult<String> {
        assert!(local_path.exists(), "upload of missing file");
        if self.fail_upload {
            return Err(ToolError::Http {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(format!("https://cdn.test/{key}"))
    }

    async fn delete(&self, key: &str) -> ToolResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Writes the HTML itself to a `.pdf` path
#[derive(Default)]
pub struct FakeRenderer {
    pub rendered: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl DocumentRenderer for FakeRenderer {
    async fn render_to_pdf(&self, html: &str) -> ToolResult<PathBuf> {
        self.rendered.lock().unwrap().push(html.to_string());
        let path = std::env::temp_dir().join(format!("agentic-test-{}.pdf", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, html).await?;
        Ok(path)
    }
}

/// Calendar kept in memory; ids are `evt-{n}`
#[derive(Default)]
pub struct FakeCalendar {
    pub events: Mutex<Vec<CalendarEvent>>,
    pub created: Mutex<Vec<EventDraft>>,
    pub patches: Mutex<Vec<(String, Map<String, Value>)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeCalendar {
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }
}

pub fn event(id: &str, summary: &str, start: &str, end: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.into(),
        summary: summary.into(),
        start: start.into(),
        end: end.into(),
        description: None,
        location: None,
    }
}

#[async_trait::async_trait]
impl CalendarBackend for FakeCalendar {
    async fn list_events(&self, _token: &str) -> ToolResult<Vec<CalendarEvent>> {
        Ok(self.events.lock().unwrap().clone())
    }

    async fn create_event(&self, _token: &str, draft: &EventDraft) -> ToolResult<Value> {
        let mut events = self.events.lock().unwrap();
        let id = format!("evt-{}", events.len() + 1);
        events.push(event(&id, &draft.summary, &draft.start, &draft.end));
        self.created.lock().unwrap().push(draft.clone());
        Ok(json!({"id": id}))
    }

    async fn patch_event(
        &self,
        _token: &str,
        id: &str,
        changes: &Map<String, Value>,
    ) -> ToolResult<Value> {
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), changes.clone()));
        Ok(json!({"id": id}))
    }

    async fn delete_event(&self, _token: &str, id: &str) -> ToolResult<()> {
        self.deleted.lock().unwrap().push(id.to_string());
        self.events.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePublisher {
    pub published: Mutex<Vec<(String, Value)>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl PostPublisher for FakePublisher {
    async fn publish(&self, token: &str, post: &Value) -> ToolResult<Value> {
        self.published
            .lock()
            .unwrap()
            .push((token.to_string(), post.clone()));
        if self.fail {
            return Err(ToolError::Http {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(json!({"postId": 42}))
    }
}

pub struct FakeProfile;

#[async_trait::async_trait]
impl ProfileService for FakeProfile {
    async fn profile(&self, _token: &str) -> ToolResult<Value> {
        Ok(json!({"name": "Mina", "nation": "Vietnam", "language": "vi"}))
    }

    async fn preference(&self, _token: &str) -> ToolResult<Value> {
        Ok(json!({"jobInterest": "translator"}))
    }
}

pub struct FakeSearch;

#[async_trait::async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str, limit: usize) -> ToolResult<Vec<SearchHit>> {
        Ok((1..=limit.min(2))
            .map(|i| SearchHit {
                title: format!("{query} result {i}"),
                url: format!("https://search.test/{i}"),
                snippet: format!("snippet {i}"),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl PlaceSearch for FakeSearch {
    async fn search_places(&self, query: &str, _limit: usize) -> ToolResult<Vec<Place>> {
        Ok(vec![Place {
            name: format!("{query} office"),
            address: "Seoul Jongno-gu 1".into(),
            phone: "02-000-0000".into(),
            url: "https://place.test/1".into(),
        }])
    }
}

pub struct FakeWeather;

#[async_trait::async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, location: &str) -> ToolResult<WeatherReport> {
        Ok(WeatherReport {
            location: location.to_string(),
            temperature_c: 21.0,
            feels_like_c: 20.0,
            humidity: 55,
            description: "Partly cloudy".into(),
            wind_kph: 11.0,
        })
    }
}

pub struct FakeAnimals;

#[async_trait::async_trait]
impl AnimalApi for FakeAnimals {
    async fn random_dog_image(&self) -> ToolResult<String> {
        Ok("https://dog.test/1.jpg".into())
    }

    async fn random_cat_image(&self) -> ToolResult<String> {
        Ok("https://cat.test/1.jpg".into())
    }

    async fn random_cat_fact(&self) -> ToolResult<String> {
        Ok("Cats sleep a lot.".into())
    }
}

/// Every collaborator faked, all sharing the returned handles
pub struct Fakes {
    pub calendar: Arc<FakeCalendar>,
    pub storage: Arc<FakeStorage>,
    pub renderer: Arc<FakeRenderer>,
    pub publisher: Arc<FakePublisher>,
    pub store: Arc<MemoryConversationStore>,
    pub janitor: Arc<ArtifactJanitor>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::with_calendar(FakeCalendar::default())
    }

    pub fn with_calendar(calendar: FakeCalendar) -> Self {
        let storage = Arc::new(FakeStorage::default());
        let janitor = Arc::new(ArtifactJanitor::new(
            storage.clone(),
            CancellationToken::new(),
        ));
        Self {
            calendar: Arc::new(calendar),
            storage,
            renderer: Arc::new(FakeRenderer::default()),
            publisher: Arc::new(FakePublisher::default()),
            store: Arc::new(MemoryConversationStore::new_unsafe()),
            janitor,
        }
    }

    pub fn collaborators(&self, mock: &MockProvider) -> Collaborators {
        let store: Arc<dyn ConversationStore> = self.store.clone();
        Collaborators {
            llm: gateway(mock),
            calendar: self.calendar.clone(),
            storage: self.storage.clone(),
            renderer: self.renderer.clone(),
            publisher: self.publisher.clone(),
            profile: Some(Arc::new(FakeProfile)),
            web_search: Some(Arc::new(FakeSearch)),
            places: Some(Arc::new(FakeSearch)),
            weather: Arc::new(FakeWeather),
            animals: Arc::new(FakeAnimals),
            store,
            janitor: self.janitor.clone(),
            artifact_ttl: crate::janitor::DEFAULT_ARTIFACT_TTL,
        }
    }
}
