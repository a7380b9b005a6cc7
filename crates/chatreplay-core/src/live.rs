//! Live chat source over HTTP.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt as _;
use tracing::debug;

use crate::errors::{ChatError, SourceError};
use crate::request::ChatRequest;

/// Raw chunks of the event protocol, in arrival order.
pub type ChunkStream =
    Pin<Box<dyn futures::Stream<Item = Result<Bytes, SourceError>> + Send + 'static>>;

/// Opens one chunked byte stream for a chat request.
///
/// Dropping the returned stream must release the underlying connection.
#[async_trait::async_trait]
pub trait ChunkSource: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, SourceError>;
}

/// `ChunkSource` that POSTs the request to the chat service's stream endpoint.
pub struct HttpChatSource {
    client: reqwest::Client,
    stream_url: String,
}

impl HttpChatSource {
    /// `timeout` bounds connection setup only; a stream may stay open as long
    /// as the service keeps it open.
    pub fn new(stream_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let stream_url = stream_url.into();
        if stream_url.trim().is_empty() {
            return Err(ChatError::Config("chat stream url must not be empty".into()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build chat client: {e}")))?;
        Ok(Self { client, stream_url })
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }
}

#[async_trait::async_trait]
impl ChunkSource for HttpChatSource {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, SourceError> {
        debug!(
            url = %self.stream_url,
            thread_id = %request.params.thread_id,
            "opening chat stream"
        );
        let response = self
            .client
            .post(&self.stream_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| SourceError::transport(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::Status {
                url: self.stream_url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let chunks = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| SourceError::transport(format!("chat stream read failed: {e}")))
        });
        Ok(Box::pin(chunks))
    }
}
