//! Object storage for generated artifacts

use crate::error::{Error, Result};
use crate::http::{join_url, HttpClient};
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};

/// Upload/delete of downloadable artifacts
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a local file under `key`; returns its public URL
    async fn upload(&self, local_path: &Path, key: &str) -> Result<String>;

    /// Remove the object stored under `key`
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Settings for [`HttpObjectStorage`]
#[derive(Clone, Default)]
pub struct StorageConfig {
    /// S3-compatible endpoint, e.g. `https://s3.example.com`
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Base URL objects are served from
    pub public_base_url: String,
    /// Optional bearer token for the endpoint
    pub access_token: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("public_base_url", &self.public_base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "****"))
            .finish()
    }
}

/// S3-style storage speaking plain `PUT` / `DELETE`
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    http: HttpClient,
    config: StorageConfig,
}

impl HttpObjectStorage {
    /// Create a storage client
    pub fn new(http: HttpClient, config: StorageConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() || config.bucket.trim().is_empty() {
            return Err(Error::NotConfigured(
                "storage endpoint and bucket are required".to_string(),
            ));
        }
        Ok(Self { http, config })
    }

    fn object_url(&self, key: &str) -> String {
        join_url(
            &join_url(&self.config.endpoint, &self.config.bucket),
            &encode_key(key),
        )
    }

    /// Public URL of `key`
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        let base = if self.config.public_base_url.is_empty() {
            join_url(&self.config.endpoint, &self.config.bucket)
        } else {
            self.config.public_base_url.clone()
        };
        join_url(&base, &encode_key(key))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }
}

#[async_trait::async_trait]
impl ObjectStorage for HttpObjectStorage {
    #[instrument(skip(self, local_path))]
    async fn upload(&self, local_path: &Path, key: &str) -> Result<String> {
        validate_key(key)?;
        let bytes = tokio::fs::read(local_path).await?;
        let size = bytes.len();

        let request = self
            .authorize(self.http.client().put(self.object_url(key)))
            .header(reqwest::header::CONTENT_TYPE, content_type_for(key))
            .body(bytes);
        self.http.send(request).await?;

        let url = self.public_url(key);
        info!(key = %key, size, "Uploaded artifact");
        Ok(url)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let request = self.authorize(self.http.client().delete(self.object_url(key)));
        self.http.send(request).await?;
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(Error::InvalidInput(format!("invalid object key: {key}")));
    }
    Ok(())
}

/// Percent-encode each path segment, keeping `/` separators
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpConfig;
    use std::io::Write;

    fn storage(server: &mockito::ServerGuard) -> HttpObjectStorage {
        HttpObjectStorage::new(
            HttpClient::new(HttpConfig::default()).unwrap(),
            StorageConfig {
                endpoint: server.url(),
                bucket: "artifacts".into(),
                public_base_url: "https://cdn.example.com/files".into(),
                access_token: Some("secret".into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_key("resume/u1/a.pdf").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("a/../b").is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("x.PDF"), "application/pdf");
        assert_eq!(content_type_for("x.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_debug_hides_token() {
        let config = StorageConfig {
            access_token: Some("very-secret".into()),
            ..StorageConfig::default()
        };
        assert!(!format!("{config:?}").contains("very-secret"));
    }

    #[test]
    fn test_requires_endpoint() {
        let result = HttpObjectStorage::new(
            HttpClient::new(HttpConfig::default()).unwrap(),
            StorageConfig::default(),
        );
        assert!(matches!(result, Err(Error::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/artifacts/resume/u%201.pdf")
            .match_header("authorization", "Bearer secret")
            .match_header("content-type", "application/pdf")
            .match_body("%PDF-1.4")
            .with_status(200)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/artifacts/resume/u%201.pdf")
            .with_status(204)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let storage = storage(&server);
        let url = storage.upload(file.path(), "resume/u 1.pdf").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/files/resume/u%201.pdf");
        storage.delete("resume/u 1.pdf").await.unwrap();

        put.assert_async().await;
        delete.assert_async().await;
    }
}
