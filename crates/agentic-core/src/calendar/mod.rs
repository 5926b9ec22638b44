//! Calendar add / delete / edit / check
//!
//! An inner classification picks the action. Reads of the event list may be
//! retried by the client; mutations are sent once and a failure is reported,
//! never repeated.

mod time;


pub use time::{
    build_patch_body, format_timestamp, kst, kst_now, normalize_event, parse_timestamp,
    resolve_relative_datetime, DEFAULT_EVENT_MINUTES, KST_OFFSET_SECS,
};

use crate::error::{Error, Result};
use crate::types::AgentResponse;
use agentic_llm::{LlmGateway, TaskType};
use agentic_tools::{CalendarBackend, CalendarEvent};
use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub(crate) const ACTION_INSTRUCTION: &str =
    "Decide which calendar operation the user wants.";
pub(crate) const ADD_INSTRUCTION: &str = "Extract the calendar event to create.";
pub(crate) const DELETE_INSTRUCTION: &str =
    "Pick the event the user wants to delete from the list below.";
pub(crate) const EDIT_INSTRUCTION: &str =
    "Work out which event the user wants to change and what changes.";
pub(crate) const CHECK_INSTRUCTION: &str =
    "Summarize the user's calendar events below as a readable list.";

const ACTION_EXAMPLES: &str = "Operations: add, delete, edit, check.\n\
    I have a meeting at 9am tomorrow -> add\n\
    Put lunch with Jisoo on Friday noon -> add\n\
    Cancel the dentist appointment -> delete\n\
    Remove tomorrow's meeting -> delete\n\
    Move the team dinner to 8pm -> edit\n\
    Change the meeting location to Gangnam -> edit\n\
    What do I have this week? -> check\n\
    Show my schedule -> check";

const ADD_SCHEMA: &str = r#"{"summary": "short title", "location": "", "description": "", "start": "YYYY-MM-DDTHH:MM:SS", "end": "YYYY-MM-DDTHH:MM:SS or empty"}"#;
const DELETE_SCHEMA: &str = r#"{"id": "id of the matching event, or empty when none matches"}"#;
const EDIT_SCHEMA: &str = r#"{"id": "id of the event", "summary": "only if changed", "location": "only if changed", "description": "only if changed", "start": "only if changed, YYYY-MM-DDTHH:MM:SS", "end": "only if changed"}"#;

const UNKNOWN_COMMAND: &str =
    "Sorry, I can add, delete, edit or check calendar events. Which one would you like?";

/// Shown when no event could be matched
const NO_MATCH: &str = "I couldn't find a matching event on your calendar.";

/// Source of "now"; replaced in tests
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// The four calendar operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    /// Create an event
    Add,
    /// Delete an event
    Delete,
    /// Change an event
    Edit,
    /// List events
    Check,
}

impl CalendarAction {
    /// Label used in metadata
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Edit => "edit",
            Self::Check => "check",
        }
    }

    /// Map a model label to an action
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        label
            .split(|c: char| !c.is_ascii_alphabetic())
            .map(str::to_ascii_lowercase)
            .find_map(|word| match word.as_str() {
                "add" | "create" | "insert" => Some(Self::Add),
                "delete" | "remove" | "cancel" => Some(Self::Delete),
                "edit" | "update" | "modify" | "change" | "move" => Some(Self::Edit),
                "check" | "list" | "show" | "view" => Some(Self::Check),
                _ => None,
            })
    }
}

impl fmt::Display for CalendarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar operations over a [`CalendarBackend`]
#[derive(Clone)]
pub struct CalendarService {
    llm: LlmGateway,
    backend: Arc<dyn CalendarBackend>,
    clock: Clock,
}

impl CalendarService {
    /// Create a service using the wall clock
    pub fn new(llm: LlmGateway, backend: Arc<dyn CalendarBackend>) -> Self {
        Self {
            llm,
            backend,
            clock: Arc::new(kst_now),
        }
    }

    /// Use a different clock
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Handle one calendar request
    ///
    /// `query` is the user's own wording, used for date fallbacks;
    /// `english_query` drives the prompts.
    #[instrument(skip_all)]
    pub async fn handle(&self, query: &str, english_query: &str, token: &str) -> Result<AgentResponse> {
        let Some(action) = self.classify_action(english_query).await? else {
            return Ok(AgentResponse::error(UNKNOWN_COMMAND).with_metadata("action", "unknown"));
        };
        debug!(action = %action, "Calendar action selected");

        let response = match action {
            CalendarAction::Add => self.add(query, english_query, token).await?,
            CalendarAction::Delete => self.delete(english_query, token).await?,
            CalendarAction::Edit => self.edit(english_query, token).await?,
            CalendarAction::Check => self.check(english_query, token).await?,
        };
        Ok(response.with_metadata("action", action.as_str()))
    }

    async fn classify_action(&self, english_query: &str) -> Result<Option<CalendarAction>> {
        let prompt = format!(
            "{ACTION_INSTRUCTION} Answer with one word.\n\n{ACTION_EXAMPLES}\n\n{english_query} ->"
        );
        let label = self.llm.generate_for(TaskType::Classification, &prompt).await?;
        Ok(CalendarAction::from_label(&label))
    }

    /// Structured call where undecodable output means "nothing extracted"
    async fn extract(&self, prompt: &str, schema: &str) -> Result<Map<String, Value>> {
        match self
            .llm
            .generate_structured(TaskType::Extraction.recommended_tier(), prompt, schema)
            .await
        {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(agentic_llm::Error::Parse(reason)) => {
                warn!(reason = %reason, "Calendar extraction not decodable");
                Ok(Map::new())
            }
            Err(e) => Err(Error::Llm(e)),
        }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)()
    }

    async fn add(&self, query: &str, english_query: &str, token: &str) -> Result<AgentResponse> {
        let now = self.now();
        let prompt = format!(
            "{ADD_INSTRUCTION} The current time is {} (Asia/Seoul). Resolve relative dates \
             against it and give local times without an offset.\n\nRequest: {english_query}\n\
             Original wording: {query}",
            format_timestamp(&now)
        );
        let fields = self.extract(&prompt, ADD_SCHEMA).await?;

        let Some(draft) = normalize_event(&fields, &[query, english_query], now) else {
            return Ok(AgentResponse::error(
                "I couldn't tell when the event is. Please include a day and time.",
            ));
        };

        let created = self.backend.create_event(token, &draft).await?;
        info!(start = %draft.start, "Calendar event created");

        Ok(AgentResponse::text(format!(
            "Added \"{}\" on {}.",
            draft.summary,
            display_time(&draft.start)
        ))
        .with_state("first")
        .with_metadata("event", serde_json::to_value(&draft)?)
        .with_metadata("calendar_response", created))
    }

    async fn delete(&self, english_query: &str, token: &str) -> Result<AgentResponse> {
        let events = self.backend.list_events(token).await?;
        if events.is_empty() {
            return Ok(AgentResponse::text("There are no events on your calendar.").with_state("first"));
        }

        let prompt = format!(
            "{DELETE_INSTRUCTION} The current time is {}.\n\nEvents:\n{}\n\nRequest: {english_query}",
            format_timestamp(&self.now()),
            events_context(&events)
        );
        let selection = self.extract(&prompt, DELETE_SCHEMA).await?;
        let Some(event) = find_event(&events, &selection) else {
            return Ok(AgentResponse::error(NO_MATCH));
        };

        self.backend.delete_event(token, &event.id).await?;
        info!(event_id = %event.id, "Calendar event deleted");

        Ok(AgentResponse::text(format!(
            "Deleted \"{}\" ({}).",
            event.summary,
            display_time(&event.start)
        ))
        .with_state("first")
        .with_metadata("event_id", event.id.clone()))
    }

    async fn edit(&self, english_query: &str, token: &str) -> Result<AgentResponse> {
        let events = self.backend.list_events(token).await?;
        if events.is_empty() {
            return Ok(AgentResponse::text("There are no events on your calendar.").with_state("first"));
        }

        let prompt = format!(
            "{EDIT_INSTRUCTION} Include only the fields that change. The current time is {}.\n\n\
             Events:\n{}\n\nRequest: {english_query}",
            format_timestamp(&self.now()),
            events_context(&events)
        );
        let diff = self.extract(&prompt, EDIT_SCHEMA).await?;
        let Some(event) = find_event(&events, &diff) else {
            return Ok(AgentResponse::error(NO_MATCH));
        };

        let mut body = build_patch_body(&diff);
        keep_duration(&mut body, event);
        if body.is_empty() {
            return Ok(AgentResponse::error("I couldn't tell what to change about that event."));
        }

        self.backend.patch_event(token, &event.id, &body).await?;
        info!(event_id = %event.id, fields = body.len(), "Calendar event updated");

        let changed: Vec<&str> = body.keys().map(String::as_str).collect();
        Ok(AgentResponse::text(format!(
            "Updated \"{}\" ({}).",
            event.summary,
            changed.join(", ")
        ))
        .with_state("first")
        .with_metadata("event_id", event.id.clone())
        .with_metadata("changes", Value::Object(body)))
    }

    async fn check(&self, english_query: &str, token: &str) -> Result<AgentResponse> {
        let mut events = self.backend.list_events(token).await?;
        events.sort_by(|a, b| a.start.cmp(&b.start));
        let ids: Vec<Value> = events.iter().map(|e| json!(e.id)).collect();

        if events.is_empty() {
            return Ok(AgentResponse::text("You have no events on your calendar.")
                .with_state("first")
                .with_metadata("event_ids", ids));
        }

        let prompt = format!(
            "{CHECK_INSTRUCTION} Mention each event's title, date and time. \
             The current time is {}.\n\nEvents:\n{}\n\nRequest: {english_query}",
            format_timestamp(&self.now()),
            events_context(&events)
        );
        let listing = match self.llm.generate_for(TaskType::Conversation, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => format_events(&events),
            Err(e) => {
                warn!(error = %e, "Listing generation failed, using plain listing");
                format_events(&events)
            }
        };

        Ok(AgentResponse::text(listing)
            .with_state("first")
            .with_metadata("event_ids", ids))
    }
}

/// Compact JSON lines the model can pick ids from
fn events_context(events: &[CalendarEvent]) -> String {
    events
        .iter()
        .map(|e| {
            json!({"id": e.id, "summary": e.summary, "start": e.start, "end": e.end, "location": e.location})
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The listed event named by `selection["id"]`
fn find_event<'a>(events: &'a [CalendarEvent], selection: &Map<String, Value>) -> Option<&'a CalendarEvent> {
    let id = match selection.get("id")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    events.iter().find(|e| e.id == id)
}

/// Moving the start without an end keeps the event's length
fn keep_duration(body: &mut Map<String, Value>, event: &CalendarEvent) {
    if body.contains_key("end") {
        return;
    }
    let Some(new_start) = body.get("start").and_then(Value::as_str).and_then(parse_timestamp) else {
        return;
    };
    let length = match (parse_timestamp(&event.start), parse_timestamp(&event.end)) {
        (Some(start), Some(end)) if end > start => end - start,
        _ => Duration::minutes(DEFAULT_EVENT_MINUTES),
    };
    body.insert(
        "end".to_string(),
        Value::String(format_timestamp(&(new_start + length))),
    );
}

/// Plain listing used when the model is unavailable
fn format_events(events: &[CalendarEvent]) -> String {
    let lines: Vec<String> = events
        .iter()
        .map(|e| {
            let mut line = format!("- {} ({})", e.summary, display_time(&e.start));
            if let Some(location) = e.location.as_deref().filter(|l| !l.is_empty()) {
                line.push_str(&format!(" @ {location}"));
            }
            line
        })
        .collect();
    format!("Your events:\n{}", lines.join("\n"))
}

fn display_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}
