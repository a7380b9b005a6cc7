use std::sync::Arc;

use tracing::debug;

use crate::config::{ClientConfig, ReplaySource};
use crate::errors::ChatError;
use crate::live::{ChunkSource, HttpChatSource};
use crate::playback::{PlaybackConfig, PlaybackScheduler};
use crate::replay::{
    FsTranscriptFetcher, HttpTranscriptFetcher, ReplayPathKind, TranscriptCache, TranscriptFetcher,
    resolve,
};
use crate::request::{ChatParams, ChatRequest};
use crate::stream::{ChatStream, Origin};

/// Entry point for chat streams.
///
/// Cloning is cheap and clones share one transcript cache, so build a single
/// client per process and hand out clones.
#[derive(Clone)]
pub struct ChatClient {
    live: Arc<dyn ChunkSource>,
    cache: Arc<TranscriptCache>,
}

impl ChatClient {
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::default()
    }

    /// Builds a client with the HTTP live source and the configured replay source.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ChatError> {
        let live = HttpChatSource::new(config.stream_url(), config.timeout)?;
        let fetcher: Arc<dyn TranscriptFetcher> = match &config.replay_source {
            ReplaySource::Http { base_url } => {
                Arc::new(HttpTranscriptFetcher::new(base_url.clone(), config.timeout)?)
            }
            ReplaySource::Dir(dir) => Arc::new(FsTranscriptFetcher::new(dir.clone())),
        };
        Self::builder()
            .live_source(Arc::new(live))
            .transcript_fetcher(fetcher)
            .build()
    }

    /// Builds a client from `CHATREPLAY_*` environment variables.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_config(&ClientConfig::from_env()?)
    }

    pub fn cache(&self) -> &Arc<TranscriptCache> {
        &self.cache
    }

    /// Starts a chat stream. Nothing is sent or fetched until the first pull.
    ///
    /// When `params.replay` is set the events come from a recorded transcript
    /// paced by the playback scheduler; mock fixtures always play
    /// fast-forward. Otherwise the message is sent to the live chat service.
    pub fn stream(
        &self,
        message: impl Into<String>,
        params: ChatParams,
        playback: PlaybackConfig,
    ) -> ChatStream {
        match &params.replay {
            Some(replay) => {
                let path = resolve(replay, params.interrupt_feedback.as_deref());
                let fast_forward = playback.fast_forward || path.kind == ReplayPathKind::Mock;
                debug!(path = %path.path, fast_forward, "replaying transcript");
                ChatStream::new(
                    Origin::Replay {
                        cache: self.cache.clone(),
                        path,
                    },
                    Some(PlaybackScheduler::new(fast_forward)),
                    playback,
                )
            }
            None => {
                debug!(thread_id = %params.thread_id, "streaming live chat");
                ChatStream::new(
                    Origin::Live {
                        source: self.live.clone(),
                        request: ChatRequest::new(message, params),
                    },
                    None,
                    playback,
                )
            }
        }
    }
}

/// Builder used to plug the live source and transcript fetcher into a client.
#[derive(Default)]
pub struct ChatClientBuilder {
    live: Option<Arc<dyn ChunkSource>>,
    fetcher: Option<Arc<dyn TranscriptFetcher>>,
    cache: Option<Arc<TranscriptCache>>,
}

impl ChatClientBuilder {
    pub fn live_source(mut self, source: Arc<dyn ChunkSource>) -> Self {
        self.live = Some(source);
        self
    }

    pub fn transcript_fetcher(mut self, fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Shares an existing cache instead of creating one from the fetcher.
    pub fn transcript_cache(mut self, cache: Arc<TranscriptCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<ChatClient, ChatError> {
        let live = self
            .live
            .ok_or_else(|| ChatError::Config("a live chunk source is required".into()))?;
        let cache = match (self.cache, self.fetcher) {
            (Some(_), Some(_)) => {
                return Err(ChatError::Config(
                    "set either a transcript cache or a transcript fetcher, not both".into(),
                ));
            }
            (Some(cache), None) => cache,
            (None, Some(fetcher)) => Arc::new(TranscriptCache::new(fetcher)),
            (None, None) => {
                return Err(ChatError::Config("a transcript fetcher is required".into()));
            }
        };
        Ok(ChatClient { live, cache })
    }
}
