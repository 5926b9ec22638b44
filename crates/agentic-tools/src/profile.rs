//! User profile service client

use crate::error::Result;
use crate::http::{join_url, HttpClient};
use serde_json::Value;
use tracing::instrument;

/// Profile and preference lookups for the calling user
#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    /// `GET /users/profile`
    async fn profile(&self, token: &str) -> Result<Value>;

    /// `GET /users/preference`
    async fn preference(&self, token: &str) -> Result<Value>;
}

/// HTTP implementation of [`ProfileService`]
#[derive(Debug, Clone)]
pub struct HttpProfileService {
    http: HttpClient,
    base_url: String,
}

impl HttpProfileService {
    /// Create a client for the service at `base_url`
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path: &str, token: &str) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        self.http
            .get_json(|c| c.get(&url).bearer_auth(token))
            .await
    }
}

#[async_trait::async_trait]
impl ProfileService for HttpProfileService {
    #[instrument(skip(self, token))]
    async fn profile(&self, token: &str) -> Result<Value> {
        self.get("users/profile", token).await
    }

    #[instrument(skip(self, token))]
    async fn preference(&self, token: &str) -> Result<Value> {
        self.get("users/preference", token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpConfig;

    #[tokio::test]
    async fn test_profile_and_preference() {
        let mut server = mockito::Server::new_async().await;
        let profile = server
            .mock("GET", "/users/profile")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(r#"{"name": "Kim", "nationality": "VN"}"#)
            .create_async()
            .await;
        let preference = server
            .mock("GET", "/users/preference")
            .with_status(200)
            .with_body(r#"{"language": "vi"}"#)
            .create_async()
            .await;

        let service =
            HttpProfileService::new(HttpClient::new(HttpConfig::default()).unwrap(), server.url());

        assert_eq!(service.profile("tok").await.unwrap()["name"], "Kim");
        assert_eq!(service.preference("tok").await.unwrap()["language"], "vi");
        profile.assert_async().await;
        preference.assert_async().await;
    }
}
