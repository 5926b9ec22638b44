//! HTML to PDF rendering through an external command

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Turns an HTML document into a downloadable file
#[async_trait::async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `html` and return the path of the produced PDF
    async fn render_to_pdf(&self, html: &str) -> Result<PathBuf>;
}

/// Settings for [`CommandPdfRenderer`]
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Executable, e.g. `wkhtmltopdf`
    pub command: String,
    /// Extra arguments placed before the input and output paths
    pub args: Vec<String>,
    /// Directory receiving rendered files
    pub output_dir: PathBuf,
    /// Upper bound for one render
    pub timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: "wkhtmltopdf".to_string(),
            args: vec!["--quiet".to_string(), "--encoding".to_string(), "utf-8".to_string()],
            output_dir: std::env::temp_dir().join("agentic-artifacts"),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Runs `<command> [args] <input.html> <output.pdf>`
#[derive(Debug, Clone)]
pub struct CommandPdfRenderer {
    config: RendererConfig,
}

impl CommandPdfRenderer {
    /// Create a renderer
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Directory receiving rendered files
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }
}

#[async_trait::async_trait]
impl DocumentRenderer for CommandPdfRenderer {
    #[instrument(skip(self, html), fields(command = %self.config.command, html_len = html.len()))]
    async fn render_to_pdf(&self, html: &str) -> Result<PathBuf> {
        if html.trim().is_empty() {
            return Err(Error::InvalidInput("document is empty".to_string()));
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let input = tempfile::Builder::new()
            .prefix("agentic-")
            .suffix(".html")
            .tempfile()?;
        tokio::fs::write(input.path(), html).await?;

        let output = self
            .config
            .output_dir
            .join(format!("{}.pdf", uuid::Uuid::new_v4()));

        let child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(input.path())
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match tokio::time::timeout(self.config.timeout, child).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Renderer timed out");
                return Err(Error::Timeout(self.config.timeout.as_millis() as u64));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stderr: String = stderr.chars().take(300).collect();
            return Err(Error::InvalidResponse(format!(
                "{} exited with {}: {}",
                self.config.command, result.status, stderr
            )));
        }

        if tokio::fs::metadata(&output).await.is_err() {
            return Err(Error::InvalidResponse(format!(
                "{} produced no output file",
                self.config.command
            )));
        }

        debug!(path = %output.display(), "Rendered document");
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn renderer(command: &str, dir: &Path) -> CommandPdfRenderer {
        CommandPdfRenderer::new(RendererConfig {
            command: command.to_string(),
            args: Vec::new(),
            output_dir: dir.to_path_buf(),
            timeout: Duration::from_secs(10),
        })
    }

    #[tokio::test]
    async fn test_render_with_copy_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = renderer("cp", dir.path())
            .render_to_pdf("<h1>이력서</h1>")
            .await
            .unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "<h1>이력서</h1>");
    }

    #[tokio::test]
    async fn test_failing_command_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = renderer("false", dir.path())
            .render_to_pdf("<p>x</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = renderer("definitely-not-a-renderer-binary", dir.path())
            .render_to_pdf("<p>x</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = renderer("cp", dir.path())
            .render_to_pdf("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
