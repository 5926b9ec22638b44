//! Community post publisher

use crate::error::{Error, Result};
use crate::http::{json_or_null, HttpClient};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Publishes a composed post to the community API
#[async_trait::async_trait]
pub trait PostPublisher: Send + Sync {
    /// Publish `post`; returns whatever the API answered with
    async fn publish(&self, token: &str, post: &Value) -> Result<Value>;
}

/// `multipart/form-data` publisher with a single `post` JSON part
#[derive(Debug, Clone)]
pub struct HttpPostPublisher {
    http: HttpClient,
    url: String,
}

impl HttpPostPublisher {
    /// Create a publisher posting to `url`
    #[must_use]
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl PostPublisher for HttpPostPublisher {
    #[instrument(skip(self, token, post))]
    async fn publish(&self, token: &str, post: &Value) -> Result<Value> {
        let payload = serde_json::to_string(post)
            .map_err(|e| Error::InvalidInput(format!("post is not serializable: {e}")))?;
        let part = Part::text(payload)
            .mime_str("application/json")
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let form = Form::new().part("post", part);

        let request = self
            .http
            .client()
            .post(&self.url)
            .bearer_auth(token)
            .multipart(form);

        match self.http.send(request).await {
            Ok(response) => {
                info!("Post published");
                json_or_null(response).await
            }
            Err(e) => {
                warn!(error = %e, "Post publish failed");
                Err(e)
            }
        }
    }
}
