//! Read-only lookup agents: weather, events, jobs, places

use super::{failure, AgentHandler};
use crate::error::{Error, Result};
use crate::types::{AgentRequest, AgentResponse, AgentType};
use agentic_llm::{LlmGateway, TaskType};
use agentic_tools::{Place, PlaceSearch, ProfileService, SearchHit, WeatherProvider, WebSearch};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) const LOCATION_INSTRUCTION: &str =
    "Extract the city or place the user wants the weather for.";
pub(crate) const EVENT_QUERY_INSTRUCTION: &str =
    "Rewrite the request as a short web search query for events or festivals in Korea.";

const DEFAULT_WEATHER_LOCATION: &str = "Seoul";
const RESULT_LIMIT: usize = 5;

/// Current weather for the place the user names
pub struct WeatherAgent {
    llm: LlmGateway,
    weather: Arc<dyn WeatherProvider>,
}

impl WeatherAgent {
    /// Create the agent
    pub fn new(llm: LlmGateway, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { llm, weather }
    }

    async fn location(&self, english_query: &str) -> String {
        let prompt = format!("{LOCATION_INSTRUCTION}\n\nRequest: {english_query}");
        let extracted = self
            .llm
            .generate_structured(
                TaskType::Extraction.recommended_tier(),
                &prompt,
                r#"{"location": "city name in English, or empty"}"#,
            )
            .await;
        match extracted {
            Ok(value) => value
                .get("location")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_WEATHER_LOCATION)
                .to_string(),
            Err(e) => {
                debug!(error = %e, "Location extraction failed, using default");
                DEFAULT_WEATHER_LOCATION.to_string()
            }
        }
    }
}

#[async_trait]
impl AgentHandler for WeatherAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Weather
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let location = self.location(&request.english_query).await;
        let report = match self.weather.current(&location).await {
            Ok(report) => report,
            Err(e) => {
                warn!(location = %location, error = %e, "Weather lookup failed");
                return Ok(failure(&e.into()));
            }
        };

        Ok(AgentResponse::text(format!(
            "Weather in {}: {}, {:.1}°C (feels like {:.1}°C), humidity {}%, wind {:.1} km/h.",
            report.location,
            report.description,
            report.temperature_c,
            report.feels_like_c,
            report.humidity,
            report.wind_kph
        ))
        .with_metadata("weather", serde_json::to_value(&report)?))
    }
}

fn hit_lines(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("- {} ({})", hit.title, hit.url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn not_configured(what: &str) -> AgentResponse {
    failure(&Error::Configuration(format!("{what} is not configured")))
}

/// Events and festivals found on the web
pub struct EventAgent {
    llm: LlmGateway,
    search: Option<Arc<dyn WebSearch>>,
}

impl EventAgent {
    /// Create the agent
    pub fn new(llm: LlmGateway, search: Option<Arc<dyn WebSearch>>) -> Self {
        Self { llm, search }
    }

    async fn search_query(&self, english_query: &str) -> String {
        let prompt = format!("{EVENT_QUERY_INSTRUCTION} Reply with the query only.\n\n{english_query}");
        match self.llm.generate_for(TaskType::Extraction, &prompt).await {
            Ok(query) if !query.trim().is_empty() => query.trim().trim_matches('"').to_string(),
            _ => format!("{english_query} events Korea"),
        }
    }
}

#[async_trait]
impl AgentHandler for EventAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Event
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let Some(search) = &self.search else {
            return Ok(not_configured("web search"));
        };

        let query = self.search_query(&request.english_query).await;
        let hits = match search.search(&query, RESULT_LIMIT).await {
            Ok(hits) => hits,
            Err(e) => return Ok(failure(&e.into())),
        };
        if hits.is_empty() {
            return Ok(AgentResponse::text("I couldn't find any events for that.")
                .with_metadata("search_query", query));
        }

        Ok(AgentResponse::text(format!("Here are some events I found:\n{}", hit_lines(&hits)))
            .with_metadata("search_query", query)
            .with_metadata("results", serde_json::to_value(&hits)?))
    }
}

/// Job postings, biased by the user's stated job interest
pub struct JobSearchAgent {
    search: Option<Arc<dyn WebSearch>>,
    profile: Option<Arc<dyn ProfileService>>,
}

impl JobSearchAgent {
    /// Create the agent
    pub fn new(
        search: Option<Arc<dyn WebSearch>>,
        profile: Option<Arc<dyn ProfileService>>,
    ) -> Self {
        Self { search, profile }
    }

    async fn interest(&self, token: &str) -> Option<String> {
        let profile = self.profile.as_ref()?;
        let preference = profile.preference(token).await.ok()?;
        preference
            .get("jobInterest")
            .or_else(|| preference.get("job_interest"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl AgentHandler for JobSearchAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::JobSearch
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let Some(search) = &self.search else {
            return Ok(not_configured("web search"));
        };

        let interest = self.interest(&request.token).await;
        let query = match &interest {
            Some(interest) => format!("{} {interest} jobs in Korea", request.english_query),
            None => format!("{} jobs in Korea", request.english_query),
        };
        let hits = match search.search(&query, RESULT_LIMIT).await {
            Ok(hits) => hits,
            Err(e) => return Ok(failure(&e.into())),
        };
        if hits.is_empty() {
            return Ok(AgentResponse::text("I couldn't find any job postings for that."));
        }

        let mut response = AgentResponse::text(format!(
            "Here are some job postings:\n{}",
            hit_lines(&hits)
        ))
        .with_metadata("search_query", query)
        .with_metadata("results", serde_json::to_value(&hits)?);
        if let Some(interest) = interest {
            response = response.with_metadata("job_interest", interest);
        }
        Ok(response)
    }
}

/// Nearby places
pub struct LocationAgent {
    places: Option<Arc<dyn PlaceSearch>>,
}

impl LocationAgent {
    /// Create the agent
    #[must_use]
    pub fn new(places: Option<Arc<dyn PlaceSearch>>) -> Self {
        Self { places }
    }
}

fn place_line(place: &Place) -> String {
    let mut line = format!("- {}, {}", place.name, place.address);
    if !place.phone.is_empty() {
        line.push_str(&format!(" ({})", place.phone));
    }
    line
}

#[async_trait]
impl AgentHandler for LocationAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Location
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let Some(places) = &self.places else {
            return Ok(not_configured("place search"));
        };

        // Place search works best on the user's own wording
        let found = match places.search_places(&request.query, RESULT_LIMIT).await {
            Ok(found) => found,
            Err(e) => return Ok(failure(&e.into())),
        };
        if found.is_empty() {
            return Ok(AgentResponse::text("I couldn't find any matching places."));
        }

        let lines: Vec<String> = found.iter().map(place_line).collect();
        let response = AgentResponse::text(format!("Here are some places:\n{}", lines.join("\n")))
            .with_metadata("places", serde_json::to_value(&found)?);
        Ok(match found.first().map(|p| p.url.clone()).filter(|u| !u.is_empty()) {
            Some(url) => response.with_url(url),
            None => response,
        })
    }
}
