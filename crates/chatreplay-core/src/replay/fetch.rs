use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::errors::{ChatError, SourceError};

/// Capability for reading a transcript resource by its resolved path.
#[async_trait::async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Returns the raw transcript text stored at `path`.
    async fn fetch(&self, path: &str) -> Result<String, SourceError>;
}

/// Fetches transcripts from a static file server.
pub struct HttpTranscriptFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranscriptFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ChatError::Config("replay base url must not be empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build replay client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl TranscriptFetcher for HttpTranscriptFetcher {
    async fn fetch(&self, path: &str) -> Result<String, SourceError> {
        let url = self.url_for(path);
        debug!(%url, "fetching transcript over http");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::fetch(path, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        response
            .text()
            .await
            .map_err(|e| SourceError::fetch(path, e.to_string()))
    }
}

/// Reads transcripts from a local directory.
pub struct FsTranscriptFetcher {
    root: PathBuf,
}

impl FsTranscriptFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins `path` onto the root, refusing anything that could escape it.
    fn locate(&self, path: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SourceError::fetch(path, "path escapes the transcript root"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl TranscriptFetcher for FsTranscriptFetcher {
    async fn fetch(&self, path: &str) -> Result<String, SourceError> {
        let file = self.locate(path)?;
        debug!(file = %file.display(), "reading transcript from disk");
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| SourceError::Io {
                path: file.display().to_string(),
                message: e.to_string(),
            })
    }
}
