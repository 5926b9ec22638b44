//! Calendar backend client
//!
//! The backend owns event identity; this side only builds and reads the
//! JSON it exchanges with `/calendar`.

use crate::error::Result;
use crate::http::{join_url, json_or_null, HttpClient};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// An event as returned by the calendar backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Backend-assigned identifier
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Title
    #[serde(default)]
    pub summary: String,
    /// Start timestamp with offset
    #[serde(default, deserialize_with = "event_time")]
    pub start: String,
    /// End timestamp with offset
    #[serde(default, deserialize_with = "event_time")]
    pub end: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Body of a create request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Title
    pub summary: String,
    /// Location
    #[serde(default)]
    pub location: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Start timestamp, RFC 3339 with offset
    pub start: String,
    /// End timestamp, RFC 3339 with offset
    pub end: String,
}

/// Calendar backend operations
#[async_trait::async_trait]
pub trait CalendarBackend: Send + Sync {
    /// `GET /calendar`
    async fn list_events(&self, token: &str) -> Result<Vec<CalendarEvent>>;

    /// `POST /calendar`
    async fn create_event(&self, token: &str, draft: &EventDraft) -> Result<Value>;

    /// `PATCH /calendar/{id}`; the body never carries `id`
    async fn patch_event(&self, token: &str, id: &str, changes: &Map<String, Value>)
        -> Result<Value>;

    /// `DELETE /calendar/{id}`
    async fn delete_event(&self, token: &str, id: &str) -> Result<()>;
}

/// HTTP implementation of [`CalendarBackend`]
#[derive(Debug, Clone)]
pub struct HttpCalendarBackend {
    http: HttpClient,
    base_url: String,
}

impl HttpCalendarBackend {
    /// Create a client for the backend at `base_url`
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn collection_url(&self) -> String {
        join_url(&self.base_url, "calendar")
    }

    fn event_url(&self, id: &str) -> String {
        join_url(
            &self.base_url,
            &format!("calendar/{}", urlencoding::encode(id)),
        )
    }
}

#[async_trait::async_trait]
impl CalendarBackend for HttpCalendarBackend {
    #[instrument(skip(self, token))]
    async fn list_events(&self, token: &str) -> Result<Vec<CalendarEvent>> {
        let url = self.collection_url();
        let body: Value = self
            .http
            .get_json(|c| c.get(&url).bearer_auth(token))
            .await?;

        let events = parse_event_list(body);
        debug!(count = events.len(), "Fetched calendar events");
        Ok(events)
    }

    #[instrument(skip(self, token, draft), fields(summary = %draft.summary))]
    async fn create_event(&self, token: &str, draft: &EventDraft) -> Result<Value> {
        let request = self
            .http
            .client()
            .post(self.collection_url())
            .bearer_auth(token)
            .json(draft);
        json_or_null(self.http.send(request).await?).await
    }

    #[instrument(skip(self, token, changes))]
    async fn patch_event(
        &self,
        token: &str,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<Value> {
        let mut body = changes.clone();
        body.remove("id");

        let request = self
            .http
            .client()
            .patch(self.event_url(id))
            .bearer_auth(token)
            .json(&body);
        json_or_null(self.http.send(request).await?).await
    }

    #[instrument(skip(self, token))]
    async fn delete_event(&self, token: &str, id: &str) -> Result<()> {
        let request = self
            .http
            .client()
            .delete(self.event_url(id))
            .bearer_auth(token);
        self.http.send(request).await?;
        Ok(())
    }
}

/// Accepts a bare array or an envelope (`events`, `items`, `data`).
/// Entries that do not look like events are skipped.
fn parse_event_list(body: Value) -> Vec<CalendarEvent> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => ["events", "items", "data"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Plain string, or a `{dateTime | date}` object
fn event_time<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Object(map)) => map
            .get("dateTime")
            .or_else(|| map.get("date"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn backend(server: &mockito::ServerGuard) -> HttpCalendarBackend {
        HttpCalendarBackend::new(HttpClient::new(HttpConfig::default()).unwrap(), server.url())
    }

    #[test]
    fn test_parse_event_list_shapes() {
        let flat = json!([
            {"id": "a", "summary": "Standup", "start": "2025-01-01T09:00:00+09:00", "end": "2025-01-01T09:15:00+09:00"},
            {"summary": "no id"}
        ]);
        let events = parse_event_list(flat);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "a");

        let wrapped = json!({"items": [
            {"id": 7, "summary": "Lunch", "start": {"dateTime": "2025-01-01T12:00:00+09:00"}, "end": {"date": "2025-01-01"}}
        ]});
        let events = parse_event_list(wrapped);
        assert_eq!(events[0].id, "7");
        assert_eq!(events[0].start, "2025-01-01T12:00:00+09:00");
        assert_eq!(events[0].end, "2025-01-01");

        assert!(parse_event_list(json!("nope")).is_empty());
    }

    #[tokio::test]
    async fn test_list_events_sends_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/calendar")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(r#"[{"id": "e1", "summary": "Dentist", "start": "s", "end": "e", "location": "Seoul"}]"#)
            .create_async()
            .await;

        let events = backend(&server).list_events("tok").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location.as_deref(), Some("Seoul"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_patch_event_moves_id_to_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/calendar/evt%2F1")
            .match_body(Matcher::Json(json!({"summary": "Renamed"})))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let mut changes = Map::new();
        changes.insert("id".into(), json!("evt/1"));
        changes.insert("summary".into(), json!("Renamed"));

        backend(&server)
            .patch_event("tok", "evt/1", &changes)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_failure_is_reported_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calendar")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let draft = EventDraft {
            summary: "Meeting".into(),
            start: "2025-01-02T09:00:00+09:00".into(),
            end: "2025-01-02T10:00:00+09:00".into(),
            ..EventDraft::default()
        };
        let err = backend(&server)
            .create_event("tok", &draft)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_event() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/calendar/e1")
            .with_status(204)
            .create_async()
            .await;

        backend(&server).delete_event("tok", "e1").await.unwrap();
        mock.assert_async().await;
    }
}
