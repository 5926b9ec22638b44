//! Web and place search (Kakao, Google Custom Search)

use crate::error::{Error, Result};
use crate::http::{join_url, HttpClient};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// Maximum number of results a single search may ask for
const MAX_RESULTS_CAP: usize = 10;

/// Kakao Open API base URL
pub const KAKAO_API_BASE: &str = "https://dapi.kakao.com";

/// Google Custom Search base URL
pub const GOOGLE_API_BASE: &str = "https://www.googleapis.com/customsearch/v1";

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("static regex");
}

/// A single web result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Title, markup removed
    pub title: String,
    /// Target URL
    pub url: String,
    /// Excerpt, markup removed
    pub snippet: String,
}

/// A single place result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Place name
    pub name: String,
    /// Street address (road address when available)
    pub address: String,
    /// Phone number, may be empty
    pub phone: String,
    /// Detail page
    pub url: String,
}

/// Web search
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Search the web for `query`, returning at most `limit` hits
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// Place / keyword search
#[async_trait::async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Search places matching `query`, returning at most `limit`
    async fn search_places(&self, query: &str, limit: usize) -> Result<Vec<Place>>;
}

fn strip_markup(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_RESULTS_CAP)
}

fn require_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("query must not be empty".to_string()));
    }
    Ok(query)
}

// ============================================================================
// Kakao
// ============================================================================

/// Kakao web and local search (`Authorization: KakaoAK <key>`)
#[derive(Clone)]
pub struct KakaoSearch {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for KakaoSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KakaoSearch")
            .field("api_key", &"****")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct KakaoResponse<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Deserialize)]
struct KakaoWebDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    contents: String,
}

#[derive(Deserialize)]
struct KakaoPlaceDocument {
    #[serde(default)]
    place_name: String,
    #[serde(default)]
    address_name: String,
    #[serde(default)]
    road_address_name: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    place_url: String,
}

impl KakaoSearch {
    /// Create a Kakao client
    pub fn new(http: HttpClient, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::NotConfigured("kakao api key".to_string()));
        }
        Ok(Self {
            http,
            api_key,
            base_url: KAKAO_API_BASE.to_string(),
        })
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn documents<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
        size: usize,
    ) -> Result<Vec<T>> {
        let url = join_url(&self.base_url, path);
        let size = size.to_string();
        let auth = format!("KakaoAK {}", self.api_key);
        let response: KakaoResponse<T> = self
            .http
            .get_json(|c| {
                c.get(&url)
                    .query(&[("query", query), ("size", size.as_str())])
                    .header(reqwest::header::AUTHORIZATION, &auth)
            })
            .await?;
        Ok(response.documents)
    }
}

#[async_trait::async_trait]
impl WebSearch for KakaoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query = require_query(query)?;
        let docs: Vec<KakaoWebDocument> = self
            .documents("v2/search/web", query, clamp_limit(limit))
            .await?;

        let hits: Vec<SearchHit> = docs
            .into_iter()
            .map(|d| SearchHit {
                title: strip_markup(&d.title),
                url: d.url,
                snippet: strip_markup(&d.contents),
            })
            .collect();
        debug!(count = hits.len(), "Kakao web search");
        Ok(hits)
    }
}

#[async_trait::async_trait]
impl PlaceSearch for KakaoSearch {
    #[instrument(skip(self))]
    async fn search_places(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let query = require_query(query)?;
        let docs: Vec<KakaoPlaceDocument> = self
            .documents("v2/local/search/keyword.json", query, clamp_limit(limit))
            .await?;

        Ok(docs
            .into_iter()
            .map(|d| Place {
                name: d.place_name,
                address: if d.road_address_name.is_empty() {
                    d.address_name
                } else {
                    d.road_address_name
                },
                phone: d.phone,
                url: d.place_url,
            })
            .collect())
    }
}

// ============================================================================
// Google
// ============================================================================

/// Google Custom Search JSON API
#[derive(Clone)]
pub struct GoogleSearch {
    http: HttpClient,
    api_key: String,
    cx: String,
    base_url: String,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for GoogleSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSearch")
            .field("api_key", &"****")
            .field("cx", &self.cx)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl GoogleSearch {
    /// Create a Google client
    pub fn new(http: HttpClient, api_key: impl Into<String>, cx: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let cx = cx.into();
        if api_key.trim().is_empty() || cx.trim().is_empty() {
            return Err(Error::NotConfigured("google api key and cx".to_string()));
        }
        Ok(Self {
            http,
            api_key,
            cx,
            base_url: GOOGLE_API_BASE.to_string(),
        })
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl WebSearch for GoogleSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query = require_query(query)?;
        let num = clamp_limit(limit).to_string();
        let response: GoogleResponse = self
            .http
            .get_json(|c| {
                c.get(&self.base_url).query(&[
                    ("key", self.api_key.as_str()),
                    ("cx", self.cx.as_str()),
                    ("q", query),
                    ("num", num.as_str()),
                ])
            })
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|i| SearchHit {
                title: strip_markup(&i.title),
                url: i.link,
                snippet: strip_markup(&i.snippet),
            })
            .collect())
    }
}
