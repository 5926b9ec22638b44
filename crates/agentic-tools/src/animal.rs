//! Random animal images and facts

use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde_json::Value;
use tracing::instrument;

/// Endpoints used by [`HttpAnimalApi`]
#[derive(Debug, Clone)]
pub struct AnimalEndpoints {
    /// Returns `{"message": "<image url>", "status": "success"}`
    pub dog_image: String,
    /// Returns `[{"url": "<image url>", ...}]`
    pub cat_image: String,
    /// Returns `{"fact": "..."}`
    pub cat_fact: String,
}

impl Default for AnimalEndpoints {
    fn default() -> Self {
        Self {
            dog_image: "https://dog.ceo/api/breeds/image/random".to_string(),
            cat_image: "https://api.thecatapi.com/v1/images/search".to_string(),
            cat_fact: "https://catfact.ninja/fact".to_string(),
        }
    }
}

/// Animal image/fact source
#[async_trait::async_trait]
pub trait AnimalApi: Send + Sync {
    /// URL of a random dog picture
    async fn random_dog_image(&self) -> Result<String>;

    /// URL of a random cat picture
    async fn random_cat_image(&self) -> Result<String>;

    /// A random cat fact
    async fn random_cat_fact(&self) -> Result<String>;
}

/// HTTP implementation of [`AnimalApi`]
#[derive(Debug, Clone)]
pub struct HttpAnimalApi {
    http: HttpClient,
    endpoints: AnimalEndpoints,
}

impl HttpAnimalApi {
    /// Create a client
    #[must_use]
    pub fn new(http: HttpClient, endpoints: AnimalEndpoints) -> Self {
        Self { http, endpoints }
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        self.http.get_json(|c| c.get(url)).await
    }
}

fn string_at(value: &Value, pointer: &str) -> Result<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidResponse(format!("missing {pointer}")))
}

#[async_trait::async_trait]
impl AnimalApi for HttpAnimalApi {
    #[instrument(skip(self))]
    async fn random_dog_image(&self) -> Result<String> {
        let body = self.fetch(&self.endpoints.dog_image).await?;
        string_at(&body, "/message")
    }

    #[instrument(skip(self))]
    async fn random_cat_image(&self) -> Result<String> {
        let body = self.fetch(&self.endpoints.cat_image).await?;
        string_at(&body, "/0/url")
    }

    #[instrument(skip(self))]
    async fn random_cat_fact(&self) -> Result<String> {
        let body = self.fetch(&self.endpoints.cat_fact).await?;
        string_at(&body, "/fact")
    }
}
