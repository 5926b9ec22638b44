//! Agentic Tools - external collaborator clients
//!
//! Every collaborator the core talks to sits behind an `async_trait` so the
//! core can be exercised with fakes:
//! - Calendar: event CRUD against the calendar backend
//! - Storage: artifact upload/delete
//! - Renderer: HTML to PDF
//! - Community: post publishing
//! - Profile: user profile and preferences
//! - Search / Weather / Animal: read-only lookups used by simple agents
//!
//! Reads are retried on transient failures; mutations are sent once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod animal;
pub mod bearer;
pub mod calendar;
pub mod community;
pub mod error;
pub mod http;
pub mod profile;
pub mod renderer;
pub mod search;
pub mod storage;
pub mod weather;

pub use animal::{AnimalApi, AnimalEndpoints, HttpAnimalApi};
pub use bearer::normalize_bearer;
pub use calendar::{CalendarBackend, CalendarEvent, EventDraft, HttpCalendarBackend};
pub use community::{HttpPostPublisher, PostPublisher};
pub use error::{Error, Result};
pub use http::{HttpClient, HttpConfig, RetryPolicy};
pub use profile::{HttpProfileService, ProfileService};
pub use renderer::{CommandPdfRenderer, DocumentRenderer, RendererConfig};
pub use search::{GoogleSearch, KakaoSearch, Place, PlaceSearch, SearchHit, WebSearch};
pub use storage::{HttpObjectStorage, ObjectStorage, StorageConfig};
pub use weather::{WeatherProvider, WeatherReport, WttrWeather};
