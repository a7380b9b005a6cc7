use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt as _;
use futures::stream::{self, BoxStream};
use tracing::{debug, error, warn};

use crate::codec::FrameDecoder;
use crate::errors::SourceError;
use crate::event::{DomainEvent, normalize};
use crate::live::{ChunkSource, ChunkStream};
use crate::playback::{Pacing, PlaybackConfig, PlaybackScheduler, pause};
use crate::replay::{ReplayPath, TranscriptCache};
use crate::request::ChatRequest;

/// Lifecycle of a [`ChatStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, nothing pulled yet. The source is not open.
    Idle,
    Streaming,
    /// The source ended and every record was delivered.
    Completed,
    /// The abort signal fired.
    Cancelled,
    /// The source failed. See [`ChatStream::error`].
    Errored,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Errored)
    }
}

/// Where a stream's chunks come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMode {
    Live,
    Replay(ReplayPath),
}

pub(crate) enum Origin {
    Live {
        source: Arc<dyn ChunkSource>,
        request: ChatRequest,
    },
    Replay {
        cache: Arc<TranscriptCache>,
        path: ReplayPath,
    },
}

enum End {
    Completed,
    Cancelled,
    Errored(SourceError),
}

enum Read {
    Chunk(Bytes),
    End,
    Cancelled,
    Failed(SourceError),
}

/// Lazy, ordered sequence of [`DomainEvent`]s for one chat call.
///
/// Live and replayed streams are driven through the same decoder and
/// normalizer; replayed streams are additionally paced by a
/// [`PlaybackScheduler`]. A failing source ends the sequence like a clean
/// completion does, but leaves the stream in [`StreamState::Errored`].
pub struct ChatStream {
    state: StreamState,
    mode: StreamMode,
    origin: Option<Origin>,
    chunks: Option<ChunkStream>,
    decoder: FrameDecoder,
    pending: VecDeque<DomainEvent>,
    scheduler: Option<PlaybackScheduler>,
    settle: Duration,
    playback: PlaybackConfig,
    error: Option<SourceError>,
    yielded: u64,
}

impl ChatStream {
    pub(crate) fn new(
        origin: Origin,
        scheduler: Option<PlaybackScheduler>,
        playback: PlaybackConfig,
    ) -> Self {
        let mode = match &origin {
            Origin::Live { .. } => StreamMode::Live,
            Origin::Replay { path, .. } => StreamMode::Replay(path.clone()),
        };
        Self {
            state: StreamState::Idle,
            mode,
            origin: Some(origin),
            chunks: None,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            scheduler,
            settle: Duration::ZERO,
            playback,
            error: None,
            yielded: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn mode(&self) -> &StreamMode {
        &self.mode
    }

    /// The source failure that ended this stream, if any.
    pub fn error(&self) -> Option<&SourceError> {
        self.error.as_ref()
    }

    /// Number of events handed to the caller so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` once the stream reaches a terminal state, and on every
    /// call after that.
    pub async fn next_event(&mut self) -> Option<DomainEvent> {
        if self.state.is_terminal() {
            return None;
        }
        if self.state == StreamState::Idle {
            self.state = StreamState::Streaming;
            debug!(mode = ?self.mode, "opening stream source");
            if let Err(end) = self.open().await {
                self.terminate(end);
                return None;
            }
        }

        // Nothing is consumed until its delay has elapsed: dropping this
        // future mid-wait repeats the wait but never loses an event.
        if pause(self.settle, self.playback.abort.as_ref()).await.is_err() {
            self.terminate(End::Cancelled);
            return None;
        }
        self.settle = Duration::ZERO;

        loop {
            if self.playback.is_aborted() {
                self.terminate(End::Cancelled);
                return None;
            }
            if let Some(next) = self.pending.front() {
                let pacing = self
                    .scheduler
                    .map_or(Pacing::ZERO, |scheduler| scheduler.pacing(next));
                if pause(pacing.before, self.playback.abort.as_ref()).await.is_err() {
                    self.terminate(End::Cancelled);
                    return None;
                }
                let Some(event) = self.pending.pop_front() else {
                    continue;
                };
                self.settle = pacing.after;
                debug!(seq = self.yielded, event = %event.kind(), "yielding event");
                self.yielded += 1;
                return Some(event);
            }

            match self.read_chunk().await {
                Read::Chunk(chunk) => self.decode(&chunk),
                Read::End => {
                    self.terminate(End::Completed);
                    return None;
                }
                Read::Cancelled => {
                    self.terminate(End::Cancelled);
                    return None;
                }
                Read::Failed(err) => {
                    self.terminate(End::Errored(err));
                    return None;
                }
            }
        }
    }

    /// Converts into a `futures::Stream` of events.
    pub fn into_stream(self) -> BoxStream<'static, DomainEvent> {
        stream::unfold(self, |mut chat| async move {
            chat.next_event().await.map(|event| (event, chat))
        })
        .boxed()
    }

    async fn open(&mut self) -> Result<(), End> {
        let Some(origin) = self.origin.take() else {
            return Err(End::Completed);
        };
        let opening = async move {
            match origin {
                Origin::Live { source, request } => source.open(&request).await,
                Origin::Replay { cache, path } => {
                    let text = cache.get(&path.path).await?;
                    let chunk = Bytes::copy_from_slice(text.as_bytes());
                    let chunks: ChunkStream = Box::pin(stream::once(async move { Ok(chunk) }));
                    Ok(chunks)
                }
            }
        };
        let opened = match self.playback.abort.clone() {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => return Err(End::Cancelled),
                opened = opening => opened,
            },
            None => opening.await,
        };
        self.chunks = Some(opened.map_err(End::Errored)?);
        Ok(())
    }

    async fn read_chunk(&mut self) -> Read {
        let Some(chunks) = self.chunks.as_mut() else {
            return Read::End;
        };
        let next = match self.playback.abort.clone() {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => return Read::Cancelled,
                next = chunks.next() => next,
            },
            None => chunks.next().await,
        };
        match next {
            Some(Ok(chunk)) => Read::Chunk(chunk),
            Some(Err(err)) => Read::Failed(err),
            None => Read::End,
        }
    }

    fn decode(&mut self, chunk: &[u8]) {
        for frame in self.decoder.push(chunk) {
            match normalize(&frame) {
                Ok(event) => self.pending.push_back(event),
                Err(err) => warn!(event = %err.event(), error = %err, "dropping undecodable frame"),
            }
        }
    }

    fn terminate(&mut self, end: End) {
        self.chunks = None;
        self.pending.clear();
        std::mem::take(&mut self.decoder).finish();
        self.state = match end {
            End::Completed => {
                debug!(events = self.yielded, "stream completed");
                StreamState::Completed
            }
            End::Cancelled => {
                debug!(events = self.yielded, "stream cancelled");
                StreamState::Cancelled
            }
            End::Errored(err) => {
                error!(events = self.yielded, error = %err, "stream source failed");
                self.error = Some(err);
                StreamState::Errored
            }
        };
    }
}
